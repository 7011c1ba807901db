//! Merge Tests - Alignment, Union, Subtraction, Material Transfer
//!
//! End-to-end coverage of the merge pipeline: two placed volumes aligned
//! onto a shared lattice and fused per operation, including seam material
//! inference and the placement reported for the result.

use astrovox_engine::merge::{MergeEngine, MergeOperation};
use astrovox_engine::voxel::{
    Box3I, Cell, MaterialId, MaterialPalette, VoxelVolume, WorldPlacement,
};
use glam::{DVec3, IVec3};

/// Anti-aliased solid ball around the grid center, like the asteroid seeds
/// the tooling ships.
fn solid_ball(edge: i32, radius: f64, material: MaterialId) -> VoxelVolume {
    let mut volume = VoxelVolume::new(IVec3::splat(edge));
    let center = volume.size().as_dvec3() * 0.5;
    for z in 0..edge {
        for y in 0..edge {
            for x in 0..edge {
                let p = IVec3::new(x, y, z);
                let d = (p.as_dvec3() + 0.5 - center).length();
                if d < radius {
                    let content = ((255.0 * (radius - d).min(1.0)).round() as u8).max(1);
                    volume.set_cell(p, Cell::new(content, material));
                }
            }
        }
    }
    volume
}

fn filled_box(edge: i32, fill: Box3I, content: u8, material: MaterialId) -> VoxelVolume {
    let mut volume = VoxelVolume::new(IVec3::splat(edge));
    for z in fill.min.z..=fill.max.z {
        for y in fill.min.y..=fill.max.y {
            for x in fill.min.x..=fill.max.x {
                volume.set_cell(IVec3::new(x, y, z), Cell::new(content, material));
            }
        }
    }
    volume
}

fn cell_at(volume: &VoxelVolume, p: IVec3) -> Cell {
    volume.cell(p).unwrap_or(Cell::EMPTY)
}

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Volume union
// ============================================================================

#[test]
fn test_two_sphere_union_with_seam_inference() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let mut left = solid_ball(10, 4.0, MaterialId(2));
    let mut right = solid_ball(10, 4.0, MaterialId(5));
    let left_at = WorldPlacement::at_position(DVec3::ZERO);
    let right_at = WorldPlacement::at_position(DVec3::new(6.0, 0.0, 0.0));

    let (mut volume, placement) = engine
        .merge(
            &mut left,
            &left_at,
            &mut right,
            &right_at,
            MergeOperation::UnionVolumeLeftToRight,
        )
        .unwrap();

    // Content spans lattice x 1..14 once both balls are in; padding and
    // chunk-granule rounding land the result on a single 32^3 grid whose
    // minimum sits three cells below the combined inflated bounds.
    assert_eq!(volume.size(), IVec3::splat(32));
    assert_eq!(placement.position, DVec3::new(-3.0, -3.0, -3.0));

    let dest_min = IVec3::splat(-3);

    // Lattice (6,5,5): solidly inside the left ball, just outside the right
    // one. The union keeps the left content but the right ball's material
    // arrives by neighbor inference across the seam.
    let seam = cell_at(&volume, IVec3::new(6, 5, 5) - dest_min);
    assert_eq!(seam, Cell::new(255, MaterialId(5)));

    // No filled source cell may come out weaker than it went in.
    let mut left_total = 0u64;
    let mut right_total = 0u64;
    for z in 0..10 {
        for y in 0..10 {
            for x in 0..10 {
                let p = IVec3::new(x, y, z);
                let l = cell_at(&left, p);
                let r = cell_at(&right, p);
                left_total += l.content as u64;
                right_total += r.content as u64;

                let from_left = cell_at(&volume, p - dest_min);
                assert!(
                    from_left.content >= l.content,
                    "left cell {p} weakened: {} -> {}",
                    l.content,
                    from_left.content
                );
                let from_right = cell_at(&volume, p + IVec3::new(6, 0, 0) - dest_min);
                assert!(
                    from_right.content >= r.content,
                    "right cell {p} weakened: {} -> {}",
                    r.content,
                    from_right.content
                );
            }
        }
    }

    let total = volume.total_fill_units();
    assert!(total >= left_total.max(right_total));
}

#[test]
fn test_union_swapped_arguments_and_direction_match() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let fill = Box3I::new(IVec3::splat(2), IVec3::splat(5));
    let mut a = filled_box(8, fill, 100, MaterialId(1));
    let mut b = filled_box(8, fill, 100, MaterialId(4));
    let a_at = WorldPlacement::at_position(DVec3::ZERO);
    let b_at = WorldPlacement::at_position(DVec3::new(2.0, 0.0, 0.0));

    let (first, first_place) = engine
        .merge(
            &mut a,
            &a_at,
            &mut b,
            &b_at,
            MergeOperation::UnionVolumeLeftToRight,
        )
        .unwrap();
    // Same primary (b), same base (a); only the argument order flips.
    let (second, second_place) = engine
        .merge(
            &mut b,
            &b_at,
            &mut a,
            &a_at,
            MergeOperation::UnionVolumeRightToLeft,
        )
        .unwrap();

    assert_eq!(first.size(), second.size());
    assert_eq!(first_place, second_place);
    let size = first.size();
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let p = IVec3::new(x, y, z);
                assert_eq!(cell_at(&first, p), cell_at(&second, p), "mismatch at {p}");
            }
        }
    }
}

#[test]
fn test_union_tie_goes_to_the_base_operand() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let fill = Box3I::new(IVec3::splat(2), IVec3::splat(5));
    let mut a = filled_box(8, fill, 100, MaterialId(1));
    let mut b = filled_box(8, fill, 100, MaterialId(4));
    let a_at = WorldPlacement::at_position(DVec3::ZERO);
    let b_at = WorldPlacement::at_position(DVec3::new(2.0, 0.0, 0.0));

    let (ltr, _) = engine
        .merge(
            &mut a,
            &a_at,
            &mut b,
            &b_at,
            MergeOperation::UnionVolumeLeftToRight,
        )
        .unwrap();
    let (rtl, _) = engine
        .merge(
            &mut a,
            &a_at,
            &mut b,
            &b_at,
            MergeOperation::UnionVolumeRightToLeft,
        )
        .unwrap();

    // Lattice (4,4,4) holds content 100 from both operands. dest_min is
    // (-2,-2,-2) for this pair, so the contested cell sits at (6,6,6).
    let contested = IVec3::splat(6);
    let from_ltr = cell_at(&ltr, contested);
    let from_rtl = cell_at(&rtl, contested);

    // Direction never changes the content, only who keeps the tie.
    assert_eq!(from_ltr.content, 100);
    assert_eq!(from_rtl.content, 100);
    assert_eq!(from_ltr.material, MaterialId(1));
    assert_eq!(from_rtl.material, MaterialId(4));

    let size = ltr.size();
    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let p = IVec3::new(x, y, z);
                assert_eq!(
                    cell_at(&ltr, p).content,
                    cell_at(&rtl, p).content,
                    "content diverged at {p}"
                );
            }
        }
    }
}

#[test]
fn test_union_keeps_fraction_and_primary_orientation() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let mut left = solid_ball(10, 4.0, MaterialId(2));
    let mut right = solid_ball(10, 4.0, MaterialId(5));
    let left_at = WorldPlacement::at_position(DVec3::new(-2.75, 0.0, 0.0));
    let right_at = WorldPlacement {
        position: DVec3::new(3.0, 0.0, 0.0),
        forward: DVec3::Y,
        up: DVec3::X,
    };

    let (_, placement) = engine
        .merge(
            &mut left,
            &left_at,
            &mut right,
            &right_at,
            MergeOperation::UnionVolumeLeftToRight,
        )
        .unwrap();

    // -2.75 rounds to -3 leaving +0.25; the left ball owns the low x edge,
    // so that quarter cell survives into the output position.
    assert_eq!(placement.position, DVec3::new(-5.75, -3.0, -3.0));
    assert_eq!(placement.forward, DVec3::Y);
    assert_eq!(placement.up, DVec3::X);
}

#[test]
fn test_union_of_disjoint_volumes_spans_both() {
    init_logs();
    let palette = MaterialPalette::new(MaterialId(3));
    let mut engine = MergeEngine::new(palette);
    let mut left = solid_ball(10, 4.0, MaterialId(2));
    let mut right = solid_ball(10, 4.0, MaterialId(5));
    let left_at = WorldPlacement::at_position(DVec3::ZERO);
    let right_at = WorldPlacement::at_position(DVec3::new(40.0, 0.0, 0.0));

    let (volume, placement) = engine
        .merge(
            &mut left,
            &left_at,
            &mut right,
            &right_at,
            MergeOperation::UnionVolumeLeftToRight,
        )
        .unwrap();

    // Far apart is fine, the result simply spans the gap.
    assert_eq!(volume.size(), IVec3::new(64, 32, 32));
    assert_eq!(placement.position, DVec3::new(-3.0, -3.0, -3.0));

    let dest_min = IVec3::new(-3, -3, -3);
    let left_core = cell_at(&volume, IVec3::new(5, 5, 5) - dest_min);
    assert_eq!(left_core.material, MaterialId(2));
    assert!(left_core.content > 0);
    let right_core = cell_at(&volume, IVec3::new(45, 5, 5) - dest_min);
    assert_eq!(right_core.material, MaterialId(5));
    assert!(right_core.content > 0);

    // The gap stays empty and carries the palette default material.
    let middle = cell_at(&volume, IVec3::new(25, 5, 5) - dest_min);
    assert_eq!(middle, Cell::new(0, MaterialId(3)));
}

// ============================================================================
// Subtraction
// ============================================================================

#[test]
fn test_subtraction_floor_across_the_grid() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let mut minuend = filled_box(
        8,
        Box3I::new(IVec3::splat(2), IVec3::splat(5)),
        100,
        MaterialId(1),
    );
    let mut tool = VoxelVolume::new(IVec3::splat(8));
    tool.set_cell(IVec3::new(3, 3, 3), Cell::new(30, MaterialId(9)));
    tool.set_cell(IVec3::new(4, 3, 3), Cell::new(255, MaterialId(9)));
    tool.set_cell(IVec3::new(6, 6, 6), Cell::new(200, MaterialId(9)));

    let tool_at = WorldPlacement::at_position(DVec3::new(1.0, 0.0, 0.0));
    let minuend_at = WorldPlacement::at_position(DVec3::ZERO);

    let (volume, placement) = engine
        .merge(
            &mut tool,
            &tool_at,
            &mut minuend,
            &minuend_at,
            MergeOperation::SubtractVolumeLeftFromRight,
        )
        .unwrap();

    // Carving happens in place on the minuend's own grid.
    assert_eq!(volume.size(), IVec3::splat(8));
    assert_eq!(placement.position, DVec3::ZERO);

    for z in 0..8 {
        for y in 0..8 {
            for x in 0..8 {
                let p = IVec3::new(x, y, z);
                let base = cell_at(&minuend, p).content;
                let carve = cell_at(&tool, p - IVec3::new(1, 0, 0)).content;
                assert_eq!(
                    cell_at(&volume, p).content,
                    base.saturating_sub(carve),
                    "wrong remainder at {p}"
                );
            }
        }
    }

    // Partially and fully carved cells keep the minuend's material.
    assert_eq!(
        cell_at(&volume, IVec3::new(4, 3, 3)),
        Cell::new(70, MaterialId(1))
    );
    assert_eq!(
        cell_at(&volume, IVec3::new(5, 3, 3)),
        Cell::new(0, MaterialId(1))
    );
}

// ============================================================================
// Material transfer
// ============================================================================

#[test]
fn test_material_transfer_preserves_content_everywhere() {
    init_logs();
    let mut engine = MergeEngine::new(MaterialPalette::default());
    let mut body = filled_box(
        8,
        Box3I::new(IVec3::splat(2), IVec3::splat(4)),
        120,
        MaterialId(1),
    );
    let mut donor = filled_box(
        8,
        Box3I::new(IVec3::ZERO, IVec3::splat(1)),
        50,
        MaterialId(7),
    );

    let donor_at = WorldPlacement::at_position(DVec3::new(4.0, 4.0, 4.0));
    let body_at = WorldPlacement::at_position(DVec3::ZERO);

    let (volume, _) = engine
        .merge(
            &mut donor,
            &donor_at,
            &mut body,
            &body_at,
            MergeOperation::UnionMaterialLeftToRight,
        )
        .unwrap();

    assert_eq!(volume.size(), IVec3::splat(8));
    for z in 0..8 {
        for y in 0..8 {
            for x in 0..8 {
                let p = IVec3::new(x, y, z);
                assert_eq!(
                    cell_at(&volume, p).content,
                    cell_at(&body, p).content,
                    "content changed at {p}"
                );
            }
        }
    }

    // Inside the donor's reach the paint took over.
    assert_eq!(
        cell_at(&volume, IVec3::new(4, 4, 4)),
        Cell::new(120, MaterialId(7))
    );
    // Beyond it the body keeps its own.
    assert_eq!(
        cell_at(&volume, IVec3::new(3, 3, 3)),
        Cell::new(120, MaterialId(1))
    );
    // Donor content over empty body cells pre-paints them.
    assert_eq!(
        cell_at(&volume, IVec3::new(5, 5, 5)),
        Cell::new(0, MaterialId(7))
    );
}
