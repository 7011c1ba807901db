use glam::{DVec3, IVec3};
use serde::{Deserialize, Serialize};

#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
pub struct MaterialId(pub u8);

impl MaterialId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u8> for MaterialId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

/// One cell of an asteroid grid: fill amount plus palette index.
/// Content 0 is empty space; material is meaningful when content > 0 but may
/// be pre-painted on empty cells.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Cell {
    pub content: u8,
    pub material: MaterialId,
}

static_assertions::assert_eq_size!(Cell, [u8; 2]);

impl Cell {
    pub const EMPTY: Cell = Cell {
        content: 0,
        material: MaterialId(0),
    };

    pub const fn new(content: u8, material: MaterialId) -> Self {
        Self { content, material }
    }

    pub const fn is_filled(self) -> bool {
        self.content > 0
    }
}

/// Which cell channels a range transfer touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Content,
    Material,
    Both,
}

impl Channels {
    pub fn has_content(self) -> bool {
        matches!(self, Channels::Content | Channels::Both)
    }

    pub fn has_material(self) -> bool {
        matches!(self, Channels::Material | Channels::Both)
    }
}

/// Inclusive integer box: both `min` and `max` are cells inside the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Box3I {
    pub min: IVec3,
    pub max: IVec3,
}

impl Box3I {
    pub const fn new(min: IVec3, max: IVec3) -> Self {
        Self { min, max }
    }

    pub fn from_size(size: IVec3) -> Self {
        Self {
            min: IVec3::ZERO,
            max: size - IVec3::ONE,
        }
    }

    pub fn single(p: IVec3) -> Self {
        Self { min: p, max: p }
    }

    pub fn size(&self) -> IVec3 {
        self.max - self.min + IVec3::ONE
    }

    pub fn cell_count(&self) -> u64 {
        let s = self.size();
        s.x as u64 * s.y as u64 * s.z as u64
    }

    pub fn contains(&self, p: IVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Box3I) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    pub fn intersection(&self, other: &Box3I) -> Option<Box3I> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.cmple(max).all() {
            Some(Box3I { min, max })
        } else {
            None
        }
    }

    pub fn union(&self, other: &Box3I) -> Box3I {
        Box3I {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn inflate(&self, cells: i32) -> Box3I {
        Box3I {
            min: self.min - IVec3::splat(cells),
            max: self.max + IVec3::splat(cells),
        }
    }

    pub fn translate(&self, delta: IVec3) -> Box3I {
        Box3I {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    pub fn include(&mut self, p: IVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }
}

/// Anchors a volume's cell (0,0,0) corner in world space. Positions are f64:
/// save files place asteroids hundreds of kilometers out. Orientation is
/// carried through merges untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPlacement {
    pub position: DVec3,
    pub forward: DVec3,
    pub up: DVec3,
}

impl WorldPlacement {
    pub fn at_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for WorldPlacement {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            forward: DVec3::NEG_Z,
            up: DVec3::Y,
        }
    }
}
