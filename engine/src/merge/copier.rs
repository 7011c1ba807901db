use glam::IVec3;

use crate::merge::align::OperandFrame;
use crate::merge::infer::infer_material;
use crate::merge::operation::OperationFamily;
use crate::voxel::{Box3I, Channels, ChunkCache, StorageError, VoxelVolume, TRANSFER_EDGE_MAX};

/// Work done by one copy pass, for the completion log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyStats {
    pub blocks: u64,
    pub cells: u64,
}

/// Walk an inclusive region in cuboid blocks no larger than
/// [`TRANSFER_EDGE_MAX`] per axis, lowest corner first, x fastest.
pub fn for_each_block(
    region: Box3I,
    mut f: impl FnMut(Box3I) -> Result<(), StorageError>,
) -> Result<(), StorageError> {
    let mut z = region.min.z;
    while z <= region.max.z {
        let z_max = (z + TRANSFER_EDGE_MAX - 1).min(region.max.z);
        let mut y = region.min.y;
        while y <= region.max.y {
            let y_max = (y + TRANSFER_EDGE_MAX - 1).min(region.max.y);
            let mut x = region.min.x;
            while x <= region.max.x {
                let x_max = (x + TRANSFER_EDGE_MAX - 1).min(region.max.x);
                f(Box3I::new(
                    IVec3::new(x, y, z),
                    IVec3::new(x_max, y_max, z_max),
                ))?;
                x = x_max + 1;
            }
            y = y_max + 1;
        }
        z = z_max + 1;
    }
    Ok(())
}

/// Region a pass walks for one operand: inflated content clipped to the grid.
fn pass_region(source: &VoxelVolume, frame: &OperandFrame) -> Option<Box3I> {
    frame.inflated.intersection(&source.grid_bounds())
}

/// Straight block copy of the operand's inflated content into the
/// destination lattice. Cells whose lattice position falls outside the
/// destination box are dropped, which only happens when the destination
/// reuses the primary operand's grid.
pub fn copy_base(
    source: &VoxelVolume,
    frame: &OperandFrame,
    dest: &mut VoxelVolume,
    dest_min: IVec3,
    channels: Channels,
) -> Result<CopyStats, StorageError> {
    let mut stats = CopyStats::default();
    let Some(region) = pass_region(source, frame) else {
        return Ok(stats);
    };

    let shift = frame.lattice_origin - dest_min;
    let dest_bounds = dest.grid_bounds();
    let mut cache = ChunkCache::new();

    for_each_block(region, |block| {
        let target = block.translate(shift);
        let Some(clipped) = target.intersection(&dest_bounds) else {
            return Ok(());
        };
        cache.resize(block.size());
        source.read_range(&mut cache, channels, IVec3::ZERO, block)?;
        dest.write_range(&cache, channels, clipped.min - target.min, clipped)?;
        stats.blocks += 1;
        stats.cells += clipped.cell_count();
        Ok(())
    })?;

    Ok(stats)
}

struct OverlayChannels {
    src: Channels,
    dest: Channels,
    write: Channels,
}

fn overlay_channels(family: OperationFamily) -> OverlayChannels {
    match family {
        OperationFamily::UnionVolume => OverlayChannels {
            src: Channels::Both,
            dest: Channels::Both,
            write: Channels::Both,
        },
        // Subtraction never touches materials; transfer never touches content.
        OperationFamily::SubtractVolume => OverlayChannels {
            src: Channels::Content,
            dest: Channels::Content,
            write: Channels::Content,
        },
        OperationFamily::UnionMaterial => OverlayChannels {
            src: Channels::Both,
            dest: Channels::Material,
            write: Channels::Material,
        },
    }
}

/// Read-modify-write pass layering the overlay operand onto an already
/// populated destination, applying the per-operation cell rule:
///
/// - volume union: larger content wins and brings its material along, a
///   strict tie keeps what the base pass wrote; where the overlay is empty
///   over existing content, the material is re-sourced from the overlay's
///   nearest filled neighbor so seams pick up the joining body's look;
/// - subtraction: saturating content decrement;
/// - material transfer: donor repaints every cell it has content over.
pub fn copy_overlay(
    source: &VoxelVolume,
    frame: &OperandFrame,
    dest: &mut VoxelVolume,
    dest_min: IVec3,
    family: OperationFamily,
) -> Result<CopyStats, StorageError> {
    let mut stats = CopyStats::default();
    let Some(region) = pass_region(source, frame) else {
        return Ok(stats);
    };

    let shift = frame.lattice_origin - dest_min;
    let dest_bounds = dest.grid_bounds();
    let ch = overlay_channels(family);
    let mut src_cache = ChunkCache::new();
    let mut dest_cache = ChunkCache::new();

    for_each_block(region, |block| {
        let target = block.translate(shift);
        let Some(clipped) = target.intersection(&dest_bounds) else {
            return Ok(());
        };
        src_cache.resize(block.size());
        source.read_range(&mut src_cache, ch.src, IVec3::ZERO, block)?;
        dest_cache.resize(clipped.size());
        dest.read_range(&mut dest_cache, ch.dest, IVec3::ZERO, clipped)?;

        for z in clipped.min.z..=clipped.max.z {
            for y in clipped.min.y..=clipped.max.y {
                for x in clipped.min.x..=clipped.max.x {
                    let p = IVec3::new(x, y, z);
                    let src_local = p - target.min;
                    let dest_local = p - clipped.min;
                    match family {
                        OperationFamily::UnionVolume => {
                            let src = src_cache.cell(src_local);
                            let dst = dest_cache.cell(dest_local);
                            if src.content > dst.content {
                                dest_cache.set_cell(dest_local, src);
                            } else if src.content == 0 && dst.content > 0 {
                                if let Some(donor) = infer_material(&src_cache, src_local) {
                                    dest_cache.set_material(dest_local, donor);
                                }
                            }
                        }
                        OperationFamily::SubtractVolume => {
                            let sub = src_cache.content(src_local);
                            if sub > 0 {
                                let cur = dest_cache.content(dest_local);
                                dest_cache.set_content(dest_local, cur.saturating_sub(sub));
                            }
                        }
                        OperationFamily::UnionMaterial => {
                            if src_cache.content(src_local) > 0 {
                                dest_cache
                                    .set_material(dest_local, src_cache.material(src_local));
                            }
                        }
                    }
                }
            }
        }

        dest.write_range(&dest_cache, ch.write, IVec3::ZERO, clipped)?;
        stats.blocks += 1;
        stats.cells += clipped.cell_count();
        Ok(())
    })?;

    Ok(stats)
}
