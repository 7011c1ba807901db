//! Astrovox Engine Library
//!
//! Chunked voxel storage and merge tooling for asteroid volumes.
//! This library provides the cell grid, the grid-alignment and copy
//! pipeline that fuses two placed volumes into one, and procedural
//! sphere generation for seeding new asteroids.
//!
//! # Modules
//!
//! - [`voxel`] - Cell types, chunked volume storage, transfer cache, material palette, `.avox` files
//! - [`merge`] - Lattice alignment, base/overlay copy passes, seam material inference
//! - [`generate`] - Procedural solid and hollow sphere volumes
//!
//! # Example
//!
//! ```ignore
//! use astrovox_engine::generate::{build_sphere, SphereSpec};
//! use astrovox_engine::merge::{MergeEngine, MergeOperation};
//! use astrovox_engine::voxel::{MaterialPalette, SizeQuantizer, WorldPlacement};
//! use glam::DVec3;
//!
//! let palette = MaterialPalette::default();
//! let quantizer = SizeQuantizer::default();
//!
//! // Two rock balls, six cells apart.
//! let mut left = build_sphere(&SphereSpec::solid(4), &palette, &quantizer)?;
//! let mut right = build_sphere(&SphereSpec::solid(4), &palette, &quantizer)?;
//! let left_at = WorldPlacement::at_position(DVec3::ZERO);
//! let right_at = WorldPlacement::at_position(DVec3::new(6.0, 0.0, 0.0));
//!
//! // Fuse them; the right operand is the primary for shape and priority.
//! let mut engine = MergeEngine::new(palette);
//! let (merged, placement) = engine.merge(
//!     &mut left,
//!     &left_at,
//!     &mut right,
//!     &right_at,
//!     MergeOperation::UnionVolumeLeftToRight,
//! )?;
//! ```

pub mod generate;
pub mod merge;
pub mod voxel;

// Re-export the everyday surface at crate level for convenience
pub use merge::{
    compute_content_bounds, MergeEngine, MergeError, MergeOperation, MergePhase, SavedMerge,
};
pub use voxel::{
    Box3I, Cell, Channels, MaterialId, MaterialPalette, SizeQuantizer, VoxelVolume, WorldPlacement,
};
// Re-export sphere generation for seeding test asteroids
pub use generate::{build_sphere, SphereSpec};
