//! Asteroid voxel container (.avox).
//!
//! Layout (little-endian, all sections 4-byte aligned):
//! - Header (48 bytes): magic "AVOX", version, grid size, default material,
//!   stored-chunk count, metadata offset + length
//! - Per stored chunk: a 16-byte record (chunk key, run count) followed by
//!   4-byte RLE runs (length u16, content u8, material u8) that expand to
//!   exactly 32768 cells in x-fastest order
//! - JSON metadata tail (name, description, tool string)
//!
//! Chunks equal to the volume's fill cell are not stored; the loader
//! reconstructs them implicitly from the default material in the header.
//! In boundary chunks of a grid that is not a chunk-edge multiple, the
//! slack cells past the grid edge must hold the fill value.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::IVec3;
use serde::{Deserialize, Serialize};

use super::types::{Cell, MaterialId};
use super::volume::{STORAGE_CHUNK_CELLS, STORAGE_CHUNK_EDGE, VoxelVolume};

pub const AVOX_MAGIC: [u8; 4] = *b"AVOX";
pub const AVOX_VERSION: u32 = 1;
pub const HEADER_SIZE: u32 = 48;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct AvoxHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub size_x: i32,
    pub size_y: i32,
    pub size_z: i32,
    pub default_material: u32,
    pub chunk_count: u32,
    pub metadata_offset: u32,
    pub metadata_len: u32,
    pub _reserved: [u8; 12],
}

static_assertions::assert_eq_size!(AvoxHeader, [u8; 48]);

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ChunkRecord {
    key_x: i32,
    key_y: i32,
    key_z: i32,
    run_count: u32,
}

static_assertions::assert_eq_size!(ChunkRecord, [u8; 16]);

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
struct Run {
    length: u16,
    content: u8,
    material: u8,
}

static_assertions::assert_eq_size!(Run, [u8; 4]);

/// Editor-facing information carried alongside the cell data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvoxMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_with: String,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum VoxelFileError {
    FileTooShort,
    InvalidMagic,
    UnsupportedVersion(u32),
    CorruptData(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl std::fmt::Display for VoxelFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoxelFileError::FileTooShort => write!(f, "file too short for avox header"),
            VoxelFileError::InvalidMagic => write!(f, "not an avox file (bad magic)"),
            VoxelFileError::UnsupportedVersion(v) => {
                write!(f, "unsupported avox version {v} (supported: {AVOX_VERSION})")
            }
            VoxelFileError::CorruptData(msg) => write!(f, "corrupt avox data: {msg}"),
            VoxelFileError::IoError(e) => write!(f, "io error: {e}"),
            VoxelFileError::JsonError(e) => write!(f, "metadata json error: {e}"),
        }
    }
}

impl std::error::Error for VoxelFileError {}

impl From<std::io::Error> for VoxelFileError {
    fn from(e: std::io::Error) -> Self {
        VoxelFileError::IoError(e)
    }
}

impl From<serde_json::Error> for VoxelFileError {
    fn from(e: serde_json::Error) -> Self {
        VoxelFileError::JsonError(e)
    }
}

// ============================================================================
// Save
// ============================================================================

fn encode_chunk_runs(cells: &[Cell]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut iter = cells.iter();
    let Some(first) = iter.next() else {
        return runs;
    };
    let mut current = *first;
    let mut length = 1u16;
    for cell in iter {
        if *cell == current {
            length += 1;
        } else {
            runs.push(Run {
                length,
                content: current.content,
                material: current.material.0,
            });
            current = *cell;
            length = 1;
        }
    }
    runs.push(Run {
        length,
        content: current.content,
        material: current.material.0,
    });
    runs
}

pub fn save(path: &Path, volume: &VoxelVolume, metadata: &AvoxMetadata) -> Result<(), VoxelFileError> {
    let fill = volume.fill_cell();

    // Sorted chunk order keeps repeated saves byte-identical.
    let mut stored: Vec<(IVec3, &[Cell])> = volume
        .storage_chunks()
        .filter(|(_, cells)| cells.iter().any(|c| *c != fill))
        .collect();
    stored.sort_by_key(|(key, _)| (key.z, key.y, key.x));

    let mut body: Vec<u8> = Vec::new();
    for (key, cells) in &stored {
        let runs = encode_chunk_runs(cells);
        let record = ChunkRecord {
            key_x: key.x,
            key_y: key.y,
            key_z: key.z,
            run_count: runs.len() as u32,
        };
        body.extend_from_slice(bytemuck::bytes_of(&record));
        body.extend_from_slice(bytemuck::cast_slice(&runs));
    }

    let metadata_bytes = serde_json::to_vec(metadata)?;
    let size = volume.size();
    let header = AvoxHeader {
        magic: AVOX_MAGIC,
        version: AVOX_VERSION,
        size_x: size.x,
        size_y: size.y,
        size_z: size.z,
        default_material: volume.default_material().0 as u32,
        chunk_count: stored.len() as u32,
        metadata_offset: HEADER_SIZE + body.len() as u32,
        metadata_len: metadata_bytes.len() as u32,
        _reserved: [0; 12],
    };

    let mut bytes = Vec::with_capacity(HEADER_SIZE as usize + body.len() + metadata_bytes.len());
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    bytes.extend_from_slice(&body);
    bytes.extend_from_slice(&metadata_bytes);
    fs::write(path, &bytes)?;

    log::info!(
        "saved {} ({} grid, {} chunks, {} bytes)",
        path.display(),
        size,
        stored.len(),
        bytes.len()
    );
    Ok(())
}

// ============================================================================
// Load
// ============================================================================

pub fn load(path: &Path) -> Result<(VoxelVolume, AvoxMetadata), VoxelFileError> {
    let bytes = fs::read(path)?;
    if bytes.len() < HEADER_SIZE as usize {
        return Err(VoxelFileError::FileTooShort);
    }

    let header: AvoxHeader = bytemuck::pod_read_unaligned(&bytes[..HEADER_SIZE as usize]);
    if header.magic != AVOX_MAGIC {
        return Err(VoxelFileError::InvalidMagic);
    }
    if header.version != AVOX_VERSION {
        return Err(VoxelFileError::UnsupportedVersion(header.version));
    }

    let size = IVec3::new(header.size_x, header.size_y, header.size_z);
    if size.cmplt(IVec3::ZERO).any() {
        return Err(VoxelFileError::CorruptData(format!(
            "negative grid size {size}"
        )));
    }
    if header.default_material > u8::MAX as u32 {
        return Err(VoxelFileError::CorruptData(format!(
            "default material {} out of palette range",
            header.default_material
        )));
    }

    let mut volume =
        VoxelVolume::with_default_material(size, MaterialId(header.default_material as u8));
    let fill = volume.fill_cell();

    let mut cursor = HEADER_SIZE as usize;
    let mut seen_keys: HashSet<IVec3> = HashSet::new();
    for _ in 0..header.chunk_count {
        let record_end = cursor + std::mem::size_of::<ChunkRecord>();
        if record_end > bytes.len() {
            return Err(VoxelFileError::CorruptData(
                "truncated chunk record".to_string(),
            ));
        }
        let record: ChunkRecord = bytemuck::pod_read_unaligned(&bytes[cursor..record_end]);
        cursor = record_end;

        let key = IVec3::new(record.key_x, record.key_y, record.key_z);
        let base = key * STORAGE_CHUNK_EDGE;
        if base.cmplt(IVec3::ZERO).any() || base.cmpge(size).any() {
            return Err(VoxelFileError::CorruptData(format!(
                "chunk key {key} outside grid {size}"
            )));
        }
        if !seen_keys.insert(key) {
            return Err(VoxelFileError::CorruptData(format!(
                "duplicate chunk key {key}"
            )));
        }

        let runs_end = cursor + record.run_count as usize * std::mem::size_of::<Run>();
        if runs_end > bytes.len() {
            return Err(VoxelFileError::CorruptData(
                "truncated chunk runs".to_string(),
            ));
        }
        let mut cells: Vec<Cell> = Vec::with_capacity(STORAGE_CHUNK_CELLS);
        while cursor < runs_end {
            let run: Run = bytemuck::pod_read_unaligned(&bytes[cursor..cursor + 4]);
            cursor += 4;
            let next_len = cells.len() + run.length as usize;
            if next_len > STORAGE_CHUNK_CELLS {
                return Err(VoxelFileError::CorruptData(format!(
                    "chunk {key} runs expand past {STORAGE_CHUNK_CELLS} cells"
                )));
            }
            cells.resize(next_len, Cell::new(run.content, MaterialId(run.material)));
        }
        if cells.len() != STORAGE_CHUNK_CELLS {
            return Err(VoxelFileError::CorruptData(format!(
                "chunk {key} runs cover {} of {STORAGE_CHUNK_CELLS} cells",
                cells.len()
            )));
        }

        // Boundary chunks of a non-granule grid carry slack past the grid
        // edge; those cells must hold the fill value, anything else is data
        // the grid cannot address.
        let valid = (size - base).min(IVec3::splat(STORAGE_CHUNK_EDGE));
        if valid.cmplt(IVec3::splat(STORAGE_CHUNK_EDGE)).any() {
            for (idx, cell) in cells.iter().enumerate() {
                let idx = idx as i32;
                let local = IVec3::new(
                    idx % STORAGE_CHUNK_EDGE,
                    (idx / STORAGE_CHUNK_EDGE) % STORAGE_CHUNK_EDGE,
                    idx / (STORAGE_CHUNK_EDGE * STORAGE_CHUNK_EDGE),
                );
                if local.cmpge(valid).any() && *cell != fill {
                    return Err(VoxelFileError::CorruptData(format!(
                        "chunk {key} has cell data outside grid {size}"
                    )));
                }
            }
        }
        volume.insert_storage_chunk(key, cells);
    }

    let metadata = if header.metadata_len > 0 {
        let start = header.metadata_offset as usize;
        let end = start.checked_add(header.metadata_len as usize);
        match end {
            Some(end) if start >= HEADER_SIZE as usize && end <= bytes.len() => {
                serde_json::from_slice(&bytes[start..end])?
            }
            _ => {
                return Err(VoxelFileError::CorruptData(
                    "metadata section outside file".to_string(),
                ));
            }
        }
    } else {
        AvoxMetadata::default()
    };

    log::info!(
        "loaded {} ({} grid, {} chunks)",
        path.display(),
        size,
        header.chunk_count
    );
    Ok((volume, metadata))
}
