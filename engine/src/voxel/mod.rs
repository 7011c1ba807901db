//! Asteroid voxel storage: cell grid types, chunked backing storage, the
//! transfer cache, the material palette, and the `.avox` container.

pub mod avox_file;
pub mod cache;
pub mod palette;
pub mod types;
pub mod volume;

pub use avox_file::{AvoxMetadata, VoxelFileError};
pub use cache::{ChunkCache, TRANSFER_EDGE_MAX};
pub use palette::{MaterialDef, MaterialPalette};
pub use types::{Box3I, Cell, Channels, MaterialId, WorldPlacement};
pub use volume::{
    CONTENT_MARGIN, ContentSummary, STORAGE_CHUNK_EDGE, SizeQuantizer, StorageError, VoxelVolume,
};
