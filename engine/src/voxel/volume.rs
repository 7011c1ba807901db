//! Chunked asteroid cell storage.
//!
//! A volume is a sparse map of dense 32^3 cell chunks. Chunks allocate on
//! first write; unallocated space reads as the volume's fill cell, whose
//! content is always 0 and whose material is the volume's default material.
//! All bulk access goes through `read_range`/`write_range` against a
//! `ChunkCache` window, with channel selection so passes can move content
//! without disturbing material and vice versa.

use std::collections::HashMap;

use glam::IVec3;

use super::cache::ChunkCache;
use super::types::{Box3I, Cell, Channels, MaterialId};

pub const STORAGE_CHUNK_EDGE: i32 = 32;
pub const STORAGE_CHUNK_CELLS: usize =
    (STORAGE_CHUNK_EDGE * STORAGE_CHUNK_EDGE * STORAGE_CHUNK_EDGE) as usize;

/// Cells of slack added around content bounds for seam-aware passes.
pub const CONTENT_MARGIN: i32 = 1;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum StorageError {
    /// A range transfer addressed cells outside the volume's grid.
    RangeOutOfBounds { bounds: Box3I, size: IVec3 },
    /// A range transfer's cache window does not fit the cache dims.
    CacheWindowOutOfBounds {
        offset: IVec3,
        extent: IVec3,
        dims: IVec3,
    },
    /// A quantized grid size exceeds what storage can address.
    SizeOverflow { requested: IVec3, max_edge: i32 },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::RangeOutOfBounds { bounds, size } => write!(
                f,
                "range {:?}..{:?} outside volume grid {}",
                bounds.min, bounds.max, size
            ),
            StorageError::CacheWindowOutOfBounds {
                offset,
                extent,
                dims,
            } => write!(
                f,
                "cache window at {offset} extent {extent} outside cache dims {dims}"
            ),
            StorageError::SizeOverflow { requested, max_edge } => write!(
                f,
                "grid size {requested} exceeds addressable edge {max_edge}"
            ),
        }
    }
}

impl std::error::Error for StorageError {}

// ============================================================================
// Size quantization
// ============================================================================

/// Grid-size policy of the backing storage: freshly allocated destination
/// grids are rounded up to a granule multiple per axis and capped at
/// `max_edge` cells.
#[derive(Debug, Clone, Copy)]
pub struct SizeQuantizer {
    pub granularity: i32,
    pub max_edge: i32,
}

impl Default for SizeQuantizer {
    fn default() -> Self {
        Self {
            granularity: STORAGE_CHUNK_EDGE,
            max_edge: 4096,
        }
    }
}

impl SizeQuantizer {
    pub fn new(granularity: i32, max_edge: i32) -> Self {
        assert!(granularity > 0 && max_edge >= granularity);
        Self {
            granularity,
            max_edge,
        }
    }

    /// Round a raw cell extent up to the storage granule, at least one
    /// granule per axis.
    pub fn required_size(&self, raw: IVec3) -> Result<IVec3, StorageError> {
        let g = self.granularity;
        let mut out = IVec3::ZERO;
        for axis in 0..3 {
            let v = raw[axis].max(1);
            let granules = (v + g - 1) / g;
            let quantized = granules * g;
            if quantized > self.max_edge {
                return Err(StorageError::SizeOverflow {
                    requested: raw,
                    max_edge: self.max_edge,
                });
            }
            out[axis] = quantized;
        }
        Ok(out)
    }

    pub fn required_size_for(&self, bounds: Box3I) -> Result<IVec3, StorageError> {
        self.required_size(bounds.size())
    }
}

// ============================================================================
// Volume
// ============================================================================

/// Occupancy statistics derived from a full scan of allocated chunks.
#[derive(Debug, Clone, Copy)]
pub struct ContentSummary {
    /// Tight box over every cell with content > 0; `None` when empty.
    pub bounds: Option<Box3I>,
    /// Sum of all content values, for volume/ore reports.
    pub fill_units: u64,
    pub filled_cells: u64,
}

#[derive(Debug, Clone)]
struct StorageChunk {
    cells: Vec<Cell>,
}

impl StorageChunk {
    fn new(fill: Cell) -> Self {
        Self {
            cells: vec![fill; STORAGE_CHUNK_CELLS],
        }
    }
}

#[derive(Debug, Clone)]
pub struct VoxelVolume {
    size: IVec3,
    fill: Cell,
    chunks: HashMap<IVec3, StorageChunk>,
    summary: Option<ContentSummary>,
}

impl VoxelVolume {
    pub fn new(size: IVec3) -> Self {
        Self::with_default_material(size, MaterialId(0))
    }

    /// A volume whose never-written cells carry the given material at
    /// content 0.
    pub fn with_default_material(size: IVec3, material: MaterialId) -> Self {
        assert!(
            size.cmpge(IVec3::ZERO).all(),
            "volume size must be non-negative: {size}"
        );
        Self {
            size,
            fill: Cell::new(0, material),
            chunks: HashMap::new(),
            summary: None,
        }
    }

    pub fn size(&self) -> IVec3 {
        self.size
    }

    /// False for a placeholder grid with a zero dimension (no backing yet).
    pub fn is_loaded(&self) -> bool {
        self.size.cmpgt(IVec3::ZERO).all()
    }

    pub fn grid_bounds(&self) -> Box3I {
        Box3I::from_size(self.size)
    }

    pub fn default_material(&self) -> MaterialId {
        self.fill.material
    }

    pub fn in_bounds(&self, p: IVec3) -> bool {
        p.cmpge(IVec3::ZERO).all() && p.cmplt(self.size).all()
    }

    fn chunk_index(local: IVec3) -> usize {
        (local.x + local.y * STORAGE_CHUNK_EDGE + local.z * STORAGE_CHUNK_EDGE * STORAGE_CHUNK_EDGE)
            as usize
    }

    pub fn cell(&self, p: IVec3) -> Option<Cell> {
        if !self.in_bounds(p) {
            return None;
        }
        let key = p.div_euclid(IVec3::splat(STORAGE_CHUNK_EDGE));
        let local = p.rem_euclid(IVec3::splat(STORAGE_CHUNK_EDGE));
        match self.chunks.get(&key) {
            Some(chunk) => Some(chunk.cells[Self::chunk_index(local)]),
            None => Some(self.fill),
        }
    }

    /// Returns false (and writes nothing) outside the grid.
    pub fn set_cell(&mut self, p: IVec3, cell: Cell) -> bool {
        if !self.in_bounds(p) {
            return false;
        }
        let key = p.div_euclid(IVec3::splat(STORAGE_CHUNK_EDGE));
        let local = p.rem_euclid(IVec3::splat(STORAGE_CHUNK_EDGE));
        if cell == self.fill && !self.chunks.contains_key(&key) {
            return true;
        }
        let fill = self.fill;
        let chunk = self.chunks.entry(key).or_insert_with(|| StorageChunk::new(fill));
        chunk.cells[Self::chunk_index(local)] = cell;
        self.summary = None;
        true
    }

    fn validate_range(
        &self,
        cache: &ChunkCache,
        window_offset: IVec3,
        bounds: Box3I,
    ) -> Result<(), StorageError> {
        let ok_box = bounds.min.cmple(bounds.max).all()
            && self.in_bounds(bounds.min)
            && self.in_bounds(bounds.max);
        if !ok_box {
            return Err(StorageError::RangeOutOfBounds {
                bounds,
                size: self.size,
            });
        }
        let extent = bounds.size();
        let window_ok = window_offset.cmpge(IVec3::ZERO).all()
            && (window_offset + extent).cmple(cache.dims()).all();
        if !window_ok {
            return Err(StorageError::CacheWindowOutOfBounds {
                offset: window_offset,
                extent,
                dims: cache.dims(),
            });
        }
        Ok(())
    }

    /// Copy cells from the inclusive `bounds` box into `cache`, placing the
    /// box's minimum corner at `dest_offset`. Only the selected channels of
    /// the cache window are written.
    pub fn read_range(
        &self,
        cache: &mut ChunkCache,
        channels: Channels,
        dest_offset: IVec3,
        bounds: Box3I,
    ) -> Result<(), StorageError> {
        self.validate_range(cache, dest_offset, bounds)?;

        let edge = IVec3::splat(STORAGE_CHUNK_EDGE);
        let min_key = bounds.min.div_euclid(edge);
        let max_key = bounds.max.div_euclid(edge);
        for kz in min_key.z..=max_key.z {
            for ky in min_key.y..=max_key.y {
                for kx in min_key.x..=max_key.x {
                    let key = IVec3::new(kx, ky, kz);
                    let base = key * STORAGE_CHUNK_EDGE;
                    let lo = bounds.min.max(base);
                    let hi = bounds.max.min(base + edge - IVec3::ONE);
                    let chunk = self.chunks.get(&key);
                    for z in lo.z..=hi.z {
                        for y in lo.y..=hi.y {
                            for x in lo.x..=hi.x {
                                let p = IVec3::new(x, y, z);
                                let cell = match chunk {
                                    Some(c) => c.cells[Self::chunk_index(p - base)],
                                    None => self.fill,
                                };
                                let local = dest_offset + (p - bounds.min);
                                match channels {
                                    Channels::Both => cache.set_cell(local, cell),
                                    Channels::Content => cache.set_content(local, cell.content),
                                    Channels::Material => cache.set_material(local, cell.material),
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Inverse of `read_range`: copy the cache window whose minimum corner
    /// sits at `src_offset` into the inclusive `bounds` box. Only the
    /// selected channels of the stored cells change.
    pub fn write_range(
        &mut self,
        cache: &ChunkCache,
        channels: Channels,
        src_offset: IVec3,
        bounds: Box3I,
    ) -> Result<(), StorageError> {
        self.validate_range(cache, src_offset, bounds)?;
        self.summary = None;

        let edge = IVec3::splat(STORAGE_CHUNK_EDGE);
        let fill = self.fill;
        let min_key = bounds.min.div_euclid(edge);
        let max_key = bounds.max.div_euclid(edge);
        for kz in min_key.z..=max_key.z {
            for ky in min_key.y..=max_key.y {
                for kx in min_key.x..=max_key.x {
                    let key = IVec3::new(kx, ky, kz);
                    let base = key * STORAGE_CHUNK_EDGE;
                    let lo = bounds.min.max(base);
                    let hi = bounds.max.min(base + edge - IVec3::ONE);
                    let chunk = self
                        .chunks
                        .entry(key)
                        .or_insert_with(|| StorageChunk::new(fill));
                    for z in lo.z..=hi.z {
                        for y in lo.y..=hi.y {
                            for x in lo.x..=hi.x {
                                let p = IVec3::new(x, y, z);
                                let local = src_offset + (p - bounds.min);
                                let stored = &mut chunk.cells[Self::chunk_index(p - base)];
                                match channels {
                                    Channels::Both => *stored = cache.cell(local),
                                    Channels::Content => stored.content = cache.content(local),
                                    Channels::Material => stored.material = cache.material(local),
                                }
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Occupancy statistics, computed once per mutation generation.
    pub fn content_summary(&mut self) -> ContentSummary {
        if let Some(summary) = self.summary {
            return summary;
        }

        let mut bounds: Option<Box3I> = None;
        let mut fill_units = 0u64;
        let mut filled_cells = 0u64;
        for (key, chunk) in &self.chunks {
            let base = *key * STORAGE_CHUNK_EDGE;
            let mut idx = 0usize;
            for z in 0..STORAGE_CHUNK_EDGE {
                for y in 0..STORAGE_CHUNK_EDGE {
                    for x in 0..STORAGE_CHUNK_EDGE {
                        let cell = chunk.cells[idx];
                        idx += 1;
                        if cell.content == 0 {
                            continue;
                        }
                        let p = base + IVec3::new(x, y, z);
                        match &mut bounds {
                            Some(b) => b.include(p),
                            None => bounds = Some(Box3I::single(p)),
                        }
                        fill_units += cell.content as u64;
                        filled_cells += 1;
                    }
                }
            }
        }

        let summary = ContentSummary {
            bounds,
            fill_units,
            filled_cells,
        };
        log::debug!(
            "volume summary: grid {} bounds {:?} filled {} cells / {} units",
            self.size,
            bounds,
            filled_cells,
            fill_units
        );
        self.summary = Some(summary);
        summary
    }

    /// Tight box over filled cells; `None` for an empty volume.
    pub fn content_bounds(&mut self) -> Option<Box3I> {
        self.content_summary().bounds
    }

    /// Content bounds grown by one cell per face so boundary-adjacent empty
    /// cells ride along when copying. May poke outside the grid; range
    /// callers clip.
    pub fn inflated_content_bounds(&mut self) -> Option<Box3I> {
        self.content_bounds().map(|b| b.inflate(CONTENT_MARGIN))
    }

    pub fn total_fill_units(&mut self) -> u64 {
        self.content_summary().fill_units
    }

    pub fn filled_cell_count(&mut self) -> u64 {
        self.content_summary().filled_cells
    }

    pub(crate) fn fill_cell(&self) -> Cell {
        self.fill
    }

    pub(crate) fn storage_chunks(&self) -> impl Iterator<Item = (IVec3, &[Cell])> {
        self.chunks.iter().map(|(key, c)| (*key, c.cells.as_slice()))
    }

    pub(crate) fn insert_storage_chunk(&mut self, key: IVec3, cells: Vec<Cell>) {
        debug_assert_eq!(cells.len(), STORAGE_CHUNK_CELLS);
        self.chunks.insert(key, StorageChunk { cells });
        self.summary = None;
    }
}
