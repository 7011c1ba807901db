//! Asteroid merge pipeline: align two placed volumes onto a shared lattice,
//! copy the base operand, layer the overlay operand with the per-operation
//! cell rule, and hand back a freshly allocated result volume.

pub mod align;
pub mod copier;
pub mod infer;
pub mod operation;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::IVec3;

use self::align::{align, SourceDesc};
use self::copier::{copy_base, copy_overlay};
use crate::voxel::{
    avox_file, AvoxMetadata, Box3I, Channels, MaterialPalette, SizeQuantizer, StorageError,
    VoxelFileError, VoxelVolume, WorldPlacement,
};

pub use self::align::{AlignedPair, OperandFrame, UNION_PADDING};
pub use self::copier::{for_each_block, CopyStats};
pub use self::infer::{infer_material, NEIGHBOR_OFFSETS};
pub use self::operation::{MergeOperation, OperationFamily, Side};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum MergeError {
    /// An operand has a zero-dimension grid, so it has no backing data yet.
    SourceNotLoaded,
    /// No filled cells where the operation needs some.
    EmptyContentBounds,
    /// The destination grid would exceed what storage can address.
    SizeOverflow { requested: IVec3 },
    /// A range transfer against a source or the destination failed.
    Storage(StorageError),
    /// Persisting the result volume failed.
    Io(VoxelFileError),
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::SourceNotLoaded => write!(f, "source volume has no loaded grid"),
            MergeError::EmptyContentBounds => write!(f, "volume has no filled cells"),
            MergeError::SizeOverflow { requested } => {
                write!(f, "merge destination size {requested} not addressable")
            }
            MergeError::Storage(err) => write!(f, "storage transfer failed: {err}"),
            MergeError::Io(err) => write!(f, "saving merge result failed: {err}"),
        }
    }
}

impl std::error::Error for MergeError {}

impl From<StorageError> for MergeError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeOverflow { requested, .. } => MergeError::SizeOverflow { requested },
            other => MergeError::Storage(other),
        }
    }
}

impl From<VoxelFileError> for MergeError {
    fn from(err: VoxelFileError) -> Self {
        MergeError::Io(err)
    }
}

/// Content bounds of a loaded, non-empty volume, or the reason there are
/// none. The summary scan this forces is cached on the volume.
pub fn compute_content_bounds(volume: &mut VoxelVolume) -> Result<Box3I, MergeError> {
    if !volume.is_loaded() {
        return Err(MergeError::SourceNotLoaded);
    }
    volume
        .content_bounds()
        .ok_or(MergeError::EmptyContentBounds)
}

// ============================================================================
// Engine
// ============================================================================

/// Where a merge currently stands. Mostly of interest to progress UIs; the
/// engine itself is synchronous and single-threaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase {
    Idle,
    Aligning,
    CopyingBase,
    CopyingOverlay,
    Done,
}

/// A merge result persisted to disk.
#[derive(Debug)]
pub struct SavedMerge {
    pub volume: VoxelVolume,
    pub placement: WorldPlacement,
    pub path: PathBuf,
}

pub struct MergeEngine {
    palette: MaterialPalette,
    quantizer: SizeQuantizer,
    phase: MergePhase,
}

impl MergeEngine {
    pub fn new(palette: MaterialPalette) -> Self {
        Self::with_quantizer(palette, SizeQuantizer::default())
    }

    pub fn with_quantizer(palette: MaterialPalette, quantizer: SizeQuantizer) -> Self {
        Self {
            palette,
            quantizer,
            phase: MergePhase::Idle,
        }
    }

    pub fn phase(&self) -> MergePhase {
        self.phase
    }

    pub fn palette(&self) -> &MaterialPalette {
        &self.palette
    }

    /// Merge two placed volumes into a new one. Sources are only mutated
    /// through their cached content summaries; on any failure the engine
    /// drops the partial destination and returns to idle.
    ///
    /// The returned placement carries `dest_min + dest_fraction` as position
    /// and the primary operand's orientation.
    pub fn merge(
        &mut self,
        left: &mut VoxelVolume,
        left_placement: &WorldPlacement,
        right: &mut VoxelVolume,
        right_placement: &WorldPlacement,
        operation: MergeOperation,
    ) -> Result<(VoxelVolume, WorldPlacement), MergeError> {
        let result = self.run_merge(left, left_placement, right, right_placement, operation);
        self.phase = match &result {
            Ok(_) => MergePhase::Done,
            Err(_) => MergePhase::Idle,
        };
        result
    }

    /// [`merge`](Self::merge), then save the result as a timestamped `.avox`
    /// under `output_dir`. A failed save leaves whatever partial file exists
    /// on disk for the caller to dispose of.
    pub fn merge_to_file(
        &mut self,
        left: &mut VoxelVolume,
        left_placement: &WorldPlacement,
        right: &mut VoxelVolume,
        right_placement: &WorldPlacement,
        operation: MergeOperation,
        output_dir: &Path,
    ) -> Result<SavedMerge, MergeError> {
        let (volume, placement) =
            self.merge(left, left_placement, right, right_placement, operation)?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let path = output_dir.join(format!("asteroid_merge_{stamp}.avox"));
        let metadata = AvoxMetadata {
            name: format!("asteroid_merge_{stamp}"),
            description: format!("result of {}", operation.label()),
            created_with: format!("astrovox {}", env!("CARGO_PKG_VERSION")),
        };

        match avox_file::save(&path, &volume, &metadata) {
            Ok(()) => Ok(SavedMerge {
                volume,
                placement,
                path,
            }),
            Err(err) => {
                self.phase = MergePhase::Idle;
                Err(err.into())
            }
        }
    }

    fn run_merge(
        &mut self,
        left: &mut VoxelVolume,
        left_placement: &WorldPlacement,
        right: &mut VoxelVolume,
        right_placement: &WorldPlacement,
        operation: MergeOperation,
    ) -> Result<(VoxelVolume, WorldPlacement), MergeError> {
        if !left.is_loaded() || !right.is_loaded() {
            return Err(MergeError::SourceNotLoaded);
        }

        self.phase = MergePhase::Aligning;
        let (left_content, right_content) = match (left.content_bounds(), right.content_bounds())
        {
            (Some(l), Some(r)) => (l, r),
            (None, None) => return Err(MergeError::EmptyContentBounds),
            (left_bounds, _) => {
                let empty_side = if left_bounds.is_none() {
                    Side::Left
                } else {
                    Side::Right
                };
                return degraded_copy(
                    operation,
                    empty_side,
                    left,
                    left_placement,
                    right,
                    right_placement,
                );
            }
        };

        let left_desc = SourceDesc {
            size: left.size(),
            content: left_content,
            world_min: left_placement.position,
        };
        let right_desc = SourceDesc {
            size: right.size(),
            content: right_content,
            world_min: right_placement.position,
        };
        let pair = align(left_desc, right_desc, operation, &self.quantizer)?;

        let mut dest =
            VoxelVolume::with_default_material(pair.dest_size, self.palette.default_material());

        self.phase = MergePhase::CopyingBase;
        let base_side = operation.base_side();
        let base_volume: &VoxelVolume = match base_side {
            Side::Left => left,
            Side::Right => right,
        };
        let base_stats = copy_base(
            base_volume,
            pair.frame(base_side),
            &mut dest,
            pair.dest_min,
            Channels::Both,
        )?;

        self.phase = MergePhase::CopyingOverlay;
        let overlay_side = operation.overlay_side();
        let overlay_volume: &VoxelVolume = match overlay_side {
            Side::Left => left,
            Side::Right => right,
        };
        let overlay_stats = copy_overlay(
            overlay_volume,
            pair.frame(overlay_side),
            &mut dest,
            pair.dest_min,
            operation.family(),
        )?;

        let primary_placement = match operation.primary_side() {
            Side::Left => left_placement,
            Side::Right => right_placement,
        };
        let placement = WorldPlacement {
            position: pair.dest_min.as_dvec3() + pair.dest_fraction,
            forward: primary_placement.forward,
            up: primary_placement.up,
        };

        log::info!(
            "merge {}: dest {} at {:?}, base {} cells / {} blocks, overlay {} cells / {} blocks",
            operation.label(),
            pair.dest_size,
            placement.position,
            base_stats.cells,
            base_stats.blocks,
            overlay_stats.cells,
            overlay_stats.blocks,
        );

        Ok((dest, placement))
    }
}

/// One operand is empty: unions collapse to a plain copy of the other
/// operand under its own placement, a subtraction survives an empty
/// subtrahend the same way but has nothing to offer without its minuend.
fn degraded_copy(
    operation: MergeOperation,
    empty_side: Side,
    left: &VoxelVolume,
    left_placement: &WorldPlacement,
    right: &VoxelVolume,
    right_placement: &WorldPlacement,
) -> Result<(VoxelVolume, WorldPlacement), MergeError> {
    if operation.family() == OperationFamily::SubtractVolume
        && empty_side == operation.primary_side()
    {
        return Err(MergeError::EmptyContentBounds);
    }

    let (survivor, placement) = match empty_side {
        Side::Left => (right, right_placement),
        Side::Right => (left, left_placement),
    };
    log::info!(
        "merge {}: {:?} operand is empty, degrading to a copy of the other side",
        operation.label(),
        empty_side,
    );
    Ok((survivor.clone(), *placement))
}
