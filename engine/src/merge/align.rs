use glam::{DVec3, IVec3};

use crate::merge::operation::{MergeOperation, OperationFamily, Side};
use crate::voxel::{Box3I, CONTENT_MARGIN, SizeQuantizer, StorageError};

/// Cells of free space kept around the combined content when sizing a union
/// destination, so follow-up edits near the seam fit without a regrow.
pub const UNION_PADDING: i32 = 3;

/// One operand as the aligner sees it: grid size, tight content box, and the
/// world position of volume-local (0,0,0).
#[derive(Debug, Clone, Copy)]
pub struct SourceDesc {
    pub size: IVec3,
    pub content: Box3I,
    pub world_min: DVec3,
}

/// Where one operand landed on the shared lattice. `lattice_origin + fraction`
/// reproduces the operand's world minimum exactly; for the second operand the
/// snap error against the lattice lives in the fraction's difference from the
/// first one's.
#[derive(Debug, Clone, Copy)]
pub struct OperandFrame {
    /// Integer lattice cell holding the operand's volume-local (0,0,0).
    pub lattice_origin: IVec3,
    /// Sub-cell world remainder discarded by the snap.
    pub fraction: DVec3,
    /// Tight content box, volume-local.
    pub content: Box3I,
    /// Content box grown one cell per face, volume-local, unclipped.
    pub inflated: Box3I,
}

/// Both operands on one lattice plus the destination geometry derived from
/// them. `dest_min + dest_fraction` is the world placement the merge reports.
#[derive(Debug, Clone, Copy)]
pub struct AlignedPair {
    pub dest_size: IVec3,
    pub dest_min: IVec3,
    pub dest_fraction: DVec3,
    pub left: OperandFrame,
    pub right: OperandFrame,
}

impl AlignedPair {
    pub fn frame(&self, side: Side) -> &OperandFrame {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

fn frame_for(desc: &SourceDesc, rounded: DVec3, fraction: DVec3) -> OperandFrame {
    OperandFrame {
        lattice_origin: rounded.as_ivec3(),
        fraction,
        content: desc.content,
        inflated: desc.content.inflate(CONTENT_MARGIN),
    }
}

/// Snap both operands onto a common integer lattice and size the destination.
///
/// The first (left) operand fixes the lattice: its world minimum rounds to
/// the nearest integer and the remainder becomes the lattice's sub-cell
/// offset. The second operand is rounded against that offset rather than the
/// plain integer grid, otherwise the two could end up half a cell apart from
/// each other after independent rounding. Rounding is component-wise nearest,
/// halves away from zero.
///
/// Union-family destinations cover both operands' inflated content plus
/// [`UNION_PADDING`] on every face, rounded up by the quantizer (slack grows
/// toward the +faces, `dest_min` stays at the padded minimum). Subtraction
/// and material transfer reuse the primary operand's grid unchanged, so the
/// output placement equals the primary's.
pub fn align(
    left: SourceDesc,
    right: SourceDesc,
    operation: MergeOperation,
    quantizer: &SizeQuantizer,
) -> Result<AlignedPair, StorageError> {
    let rounded_left = left.world_min.round();
    let left_fraction = left.world_min - rounded_left;
    let rounded_right = (right.world_min - left_fraction).round();
    let right_fraction = right.world_min - rounded_right;

    let left_frame = frame_for(&left, rounded_left, left_fraction);
    let right_frame = frame_for(&right, rounded_right, right_fraction);

    let (dest_size, dest_min, dest_fraction) = match operation.family() {
        OperationFamily::UnionVolume => {
            let lat_left = left_frame.inflated.translate(left_frame.lattice_origin);
            let lat_right = right_frame.inflated.translate(right_frame.lattice_origin);
            let padded = lat_left.union(&lat_right).inflate(UNION_PADDING);
            let dest_size = quantizer.required_size_for(padded)?;
            // Per axis, the operand whose content reaches furthest toward
            // -infinity anchors the output, so its cells keep their exact
            // world positions there.
            let mut fraction = DVec3::ZERO;
            for axis in 0..3 {
                fraction[axis] = if lat_left.min[axis] <= lat_right.min[axis] {
                    left_frame.fraction[axis]
                } else {
                    right_frame.fraction[axis]
                };
            }
            (dest_size, padded.min, fraction)
        }
        OperationFamily::UnionMaterial | OperationFamily::SubtractVolume => {
            let (desc, frame) = match operation.primary_side() {
                Side::Left => (&left, &left_frame),
                Side::Right => (&right, &right_frame),
            };
            (desc.size, frame.lattice_origin, frame.fraction)
        }
    };

    log::debug!(
        "{}: destination {dest_size} at lattice {dest_min} (fraction {dest_fraction})",
        operation.label()
    );

    Ok(AlignedPair {
        dest_size,
        dest_min,
        dest_fraction,
        left: left_frame,
        right: right_frame,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(size: i32, content: Box3I, world_min: DVec3) -> SourceDesc {
        SourceDesc {
            size: IVec3::splat(size),
            content,
            world_min,
        }
    }

    #[test]
    fn test_integer_placements_align_verbatim() {
        let content = Box3I::new(IVec3::splat(1), IVec3::splat(8));
        let left = desc(10, content, DVec3::ZERO);
        let right = desc(10, content, DVec3::new(6.0, 0.0, 0.0));
        let pair = align(
            left,
            right,
            MergeOperation::UnionVolumeLeftToRight,
            &SizeQuantizer::default(),
        )
        .unwrap();

        assert_eq!(pair.left.lattice_origin, IVec3::ZERO);
        assert_eq!(pair.right.lattice_origin, IVec3::new(6, 0, 0));
        assert_eq!(pair.left.fraction, DVec3::ZERO);
        assert_eq!(pair.right.fraction, DVec3::ZERO);

        // Inflated boxes: (0..9)^3 and (6..15, 0..9, 0..9); plus padding 3.
        assert_eq!(pair.dest_min, IVec3::splat(-3));
        assert_eq!(pair.dest_size, IVec3::new(32, 32, 32));
        assert_eq!(pair.dest_fraction, DVec3::ZERO);
    }

    #[test]
    fn test_second_source_snaps_to_first_sources_offset() {
        let content = Box3I::new(IVec3::ZERO, IVec3::splat(4));
        let left = desc(5, content, DVec3::new(2.25, 0.0, 0.0));
        let right = desc(5, content, DVec3::new(7.6, 0.0, 0.0));
        let pair = align(
            left,
            right,
            MergeOperation::UnionVolumeRightToLeft,
            &SizeQuantizer::default(),
        )
        .unwrap();

        // round(2.25) = 2, remainder 0.25; round(7.6 - 0.25) = round(7.35) = 7.
        assert_eq!(pair.left.lattice_origin.x, 2);
        assert_eq!(pair.right.lattice_origin.x, 7);
        assert!((pair.left.fraction.x - 0.25).abs() < 1e-12);
        assert!((pair.right.fraction.x - 0.6).abs() < 1e-12);

        // Left reaches further toward -x, so its fraction anchors the output.
        assert!((pair.dest_fraction.x - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_primary_sized_operations_keep_the_primary_grid() {
        let left = desc(
            12,
            Box3I::new(IVec3::splat(2), IVec3::splat(9)),
            DVec3::new(-3.25, 1.0, 0.5),
        );
        let right = desc(
            40,
            Box3I::new(IVec3::ZERO, IVec3::splat(30)),
            DVec3::new(-10.0, -10.0, -10.0),
        );

        for op in [
            MergeOperation::SubtractVolumeRightFromLeft,
            MergeOperation::UnionMaterialRightToLeft,
        ] {
            let pair = align(left, right, op, &SizeQuantizer::default()).unwrap();
            assert_eq!(pair.dest_size, IVec3::splat(12));
            assert_eq!(pair.dest_min, pair.left.lattice_origin);
            assert_eq!(pair.dest_fraction, pair.left.fraction);
        }

        let pair = align(
            left,
            right,
            MergeOperation::SubtractVolumeLeftFromRight,
            &SizeQuantizer::default(),
        )
        .unwrap();
        assert_eq!(pair.dest_size, IVec3::splat(40));
        assert_eq!(pair.dest_min, pair.right.lattice_origin);
    }

    #[test]
    fn test_union_fraction_mixes_per_axis() {
        let content = Box3I::new(IVec3::ZERO, IVec3::splat(3));
        // Left wins on x (further -x), right wins on y, tie on z goes left.
        let left = desc(4, content, DVec3::new(0.25, 5.0, 1.25));
        let right = desc(4, content, DVec3::new(9.6, 0.4, 1.25));
        let pair = align(
            left,
            right,
            MergeOperation::UnionVolumeLeftToRight,
            &SizeQuantizer::default(),
        )
        .unwrap();

        assert!((pair.dest_fraction.x - 0.25).abs() < 1e-12);
        assert!((pair.dest_fraction.y - 0.4).abs() < 1e-12);
        assert!((pair.dest_fraction.z - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_union_size_overflow_reports_error() {
        let content = Box3I::new(IVec3::ZERO, IVec3::splat(9));
        let left = desc(10, content, DVec3::ZERO);
        let right = desc(10, content, DVec3::new(5000.0, 0.0, 0.0));
        let err = align(
            left,
            right,
            MergeOperation::UnionVolumeLeftToRight,
            &SizeQuantizer::default(),
        );
        match err {
            Err(StorageError::SizeOverflow { .. }) => {}
            other => panic!("expected SizeOverflow, got {other:?}"),
        }
    }
}
