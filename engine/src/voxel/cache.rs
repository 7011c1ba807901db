use glam::IVec3;

use super::types::{Cell, MaterialId};

/// Largest extent a transfer block may have on any axis.
pub const TRANSFER_EDGE_MAX: i32 = 64;

/// Fixed-capacity cuboid buffer used as the unit of transfer between a
/// volume's backing storage and the merge algorithms. `resize` must run
/// before any access; it establishes the local coordinate space `[0, dims)`
/// and clears the buffer. Cells are stored x-fastest, then y, then z.
#[derive(Debug, Clone)]
pub struct ChunkCache {
    dims: IVec3,
    cells: Vec<Cell>,
}

impl ChunkCache {
    pub fn new() -> Self {
        Self {
            dims: IVec3::ZERO,
            cells: Vec::new(),
        }
    }

    /// Reset the cache to a fresh all-empty buffer of the given extent.
    /// Each dimension must be in `[1, TRANSFER_EDGE_MAX]`.
    pub fn resize(&mut self, dims: IVec3) {
        assert!(
            dims.cmpgt(IVec3::ZERO).all() && dims.cmple(IVec3::splat(TRANSFER_EDGE_MAX)).all(),
            "chunk cache dims {dims} outside [1, {TRANSFER_EDGE_MAX}]"
        );
        self.dims = dims;
        self.cells.clear();
        self.cells
            .resize((dims.x * dims.y * dims.z) as usize, Cell::EMPTY);
    }

    pub fn dims(&self) -> IVec3 {
        self.dims
    }

    pub fn in_bounds(&self, local: IVec3) -> bool {
        local.cmpge(IVec3::ZERO).all() && local.cmplt(self.dims).all()
    }

    fn index(&self, local: IVec3) -> usize {
        assert!(
            self.in_bounds(local),
            "chunk cache access at {local} outside dims {}",
            self.dims
        );
        (local.x + local.y * self.dims.x + local.z * self.dims.x * self.dims.y) as usize
    }

    pub fn cell(&self, local: IVec3) -> Cell {
        self.cells[self.index(local)]
    }

    pub fn set_cell(&mut self, local: IVec3, cell: Cell) {
        let i = self.index(local);
        self.cells[i] = cell;
    }

    pub fn content(&self, local: IVec3) -> u8 {
        self.cells[self.index(local)].content
    }

    pub fn set_content(&mut self, local: IVec3, content: u8) {
        let i = self.index(local);
        self.cells[i].content = content;
    }

    pub fn material(&self, local: IVec3) -> MaterialId {
        self.cells[self.index(local)].material
    }

    pub fn set_material(&mut self, local: IVec3, material: MaterialId) {
        let i = self.index(local);
        self.cells[i].material = material;
    }
}

impl Default for ChunkCache {
    fn default() -> Self {
        Self::new()
    }
}
