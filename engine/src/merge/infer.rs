use glam::IVec3;

use crate::voxel::{ChunkCache, MaterialId};

/// All 26 offsets at Chebyshev distance 1, in the fixed donor-search order:
/// the 6 face neighbors, then the 12 edge neighbors, then the 8 corner
/// neighbors; X before Y before Z, negative before positive in each slot.
/// The order decides which material wins when several donors are equally
/// near, so it is part of observable behavior and pinned by tests.
pub const NEIGHBOR_OFFSETS: [IVec3; 26] = [
    // Faces
    IVec3::new(-1, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, -1),
    IVec3::new(0, 0, 1),
    // Edges: XY, then XZ, then YZ
    IVec3::new(-1, -1, 0),
    IVec3::new(-1, 1, 0),
    IVec3::new(1, -1, 0),
    IVec3::new(1, 1, 0),
    IVec3::new(-1, 0, -1),
    IVec3::new(-1, 0, 1),
    IVec3::new(1, 0, -1),
    IVec3::new(1, 0, 1),
    IVec3::new(0, -1, -1),
    IVec3::new(0, -1, 1),
    IVec3::new(0, 1, -1),
    IVec3::new(0, 1, 1),
    // Corners
    IVec3::new(-1, -1, -1),
    IVec3::new(-1, -1, 1),
    IVec3::new(-1, 1, -1),
    IVec3::new(-1, 1, 1),
    IVec3::new(1, -1, -1),
    IVec3::new(1, -1, 1),
    IVec3::new(1, 1, -1),
    IVec3::new(1, 1, 1),
];

/// Best-effort seam material: the first filled neighbor of `at` in the fixed
/// order donates its material. Looks exactly one cell away within the cache
/// bounds; no flood fill. `None` when every in-bounds neighbor is empty.
pub fn infer_material(cache: &ChunkCache, at: IVec3) -> Option<MaterialId> {
    for offset in NEIGHBOR_OFFSETS {
        let p = at + offset;
        if !cache.in_bounds(p) {
            continue;
        }
        let cell = cache.cell(p);
        if cell.is_filled() {
            return Some(cell.material);
        }
    }
    None
}
