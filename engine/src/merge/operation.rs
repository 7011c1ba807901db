use crate::voxel::Channels;

/// The two operands of a merge, by argument position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationFamily {
    UnionVolume,
    UnionMaterial,
    SubtractVolume,
}

/// The closed set of asteroid merge operations. The trailing direction word
/// names the primary operand, the one whose shape or priority wins:
/// `…ToRight`/`…FromRight` make the right volume primary, `…ToLeft`/
/// `…FromLeft` the left one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOperation {
    UnionVolumeLeftToRight,
    UnionVolumeRightToLeft,
    UnionMaterialLeftToRight,
    UnionMaterialRightToLeft,
    SubtractVolumeLeftFromRight,
    SubtractVolumeRightFromLeft,
}

impl MergeOperation {
    pub const ALL: [MergeOperation; 6] = [
        MergeOperation::UnionVolumeLeftToRight,
        MergeOperation::UnionVolumeRightToLeft,
        MergeOperation::UnionMaterialLeftToRight,
        MergeOperation::UnionMaterialRightToLeft,
        MergeOperation::SubtractVolumeLeftFromRight,
        MergeOperation::SubtractVolumeRightFromLeft,
    ];

    pub fn family(self) -> OperationFamily {
        match self {
            MergeOperation::UnionVolumeLeftToRight | MergeOperation::UnionVolumeRightToLeft => {
                OperationFamily::UnionVolume
            }
            MergeOperation::UnionMaterialLeftToRight | MergeOperation::UnionMaterialRightToLeft => {
                OperationFamily::UnionMaterial
            }
            MergeOperation::SubtractVolumeLeftFromRight
            | MergeOperation::SubtractVolumeRightFromLeft => OperationFamily::SubtractVolume,
        }
    }

    pub fn primary_side(self) -> Side {
        match self {
            MergeOperation::UnionVolumeLeftToRight
            | MergeOperation::UnionMaterialLeftToRight
            | MergeOperation::SubtractVolumeLeftFromRight => Side::Right,
            MergeOperation::UnionVolumeRightToLeft
            | MergeOperation::UnionMaterialRightToLeft
            | MergeOperation::SubtractVolumeRightFromLeft => Side::Left,
        }
    }

    /// Which operand the unconditional base copy takes. For subtraction and
    /// material transfer that is the primary itself; for volume union the
    /// secondary goes down first and the primary is stamped over it in the
    /// overlay pass.
    pub fn base_side(self) -> Side {
        match self.family() {
            OperationFamily::UnionVolume => self.primary_side().other(),
            OperationFamily::UnionMaterial | OperationFamily::SubtractVolume => self.primary_side(),
        }
    }

    pub fn overlay_side(self) -> Side {
        self.base_side().other()
    }

    /// Channels the overlay pass writes into the destination. Subtraction
    /// must never touch material; material transfer must never touch content.
    pub fn overlay_write_channels(self) -> Channels {
        match self.family() {
            OperationFamily::UnionVolume => Channels::Both,
            OperationFamily::UnionMaterial => Channels::Material,
            OperationFamily::SubtractVolume => Channels::Content,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MergeOperation::UnionVolumeLeftToRight => "union volume left into right",
            MergeOperation::UnionVolumeRightToLeft => "union volume right into left",
            MergeOperation::UnionMaterialLeftToRight => "union material left into right",
            MergeOperation::UnionMaterialRightToLeft => "union material right into left",
            MergeOperation::SubtractVolumeLeftFromRight => "subtract volume left from right",
            MergeOperation::SubtractVolumeRightFromLeft => "subtract volume right from left",
        }
    }
}
