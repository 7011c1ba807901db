use glam::IVec3;

use crate::voxel::{Cell, MaterialId, MaterialPalette, SizeQuantizer, StorageError, VoxelVolume};

/// Empty cells kept between the sphere surface and every grid face.
pub const SPHERE_MARGIN: i32 = 2;

/// Procedural asteroid ball. `shell_radius` of 0 makes it solid; anything
/// larger hollows the inside out to that radius, leaving a shell.
#[derive(Debug, Clone, Copy)]
pub struct SphereSpec {
    pub radius: u32,
    pub shell_radius: u32,
    /// Shell material; palette default when `None`.
    pub outer_material: Option<MaterialId>,
    /// Pre-paint for the hollow interior; palette default when `None`.
    pub inner_material: Option<MaterialId>,
}

impl SphereSpec {
    pub fn solid(radius: u32) -> Self {
        Self {
            radius,
            shell_radius: 0,
            outer_material: None,
            inner_material: None,
        }
    }

    pub fn hollow(radius: u32, shell_radius: u32) -> Self {
        assert!(shell_radius < radius, "shell must fit inside the sphere");
        Self {
            radius,
            shell_radius,
            outer_material: None,
            inner_material: None,
        }
    }

    pub fn with_materials(mut self, outer: MaterialId, inner: MaterialId) -> Self {
        self.outer_material = Some(outer);
        self.inner_material = Some(inner);
        self
    }
}

/// Build a sphere volume centered in a quantized grid.
///
/// Cell centers sit at integer + 0.5. Content ramps from 255 in the body
/// down through a one-cell falloff band at the outer radius (and at the
/// shell radius for hollow spheres), but never reaches 0 while the center
/// is strictly inside the band, so content > 0 exactly matches geometric
/// membership. Hollow interiors stay empty with the inner material painted
/// on, so later fill-in merges pick it up.
pub fn build_sphere(
    spec: &SphereSpec,
    palette: &MaterialPalette,
    quantizer: &SizeQuantizer,
) -> Result<VoxelVolume, StorageError> {
    let raw_edge = 2 * (spec.radius as i32 + SPHERE_MARGIN);
    let size = quantizer.required_size(IVec3::splat(raw_edge))?;

    let outer = palette.resolve(spec.outer_material);
    let inner = palette.resolve(spec.inner_material);
    let mut volume = VoxelVolume::with_default_material(size, outer);

    let center = size.as_dvec3() * 0.5;
    let r = spec.radius as f64;
    let s = spec.shell_radius as f64;

    for z in 0..size.z {
        for y in 0..size.y {
            for x in 0..size.x {
                let p = IVec3::new(x, y, z);
                let d = (p.as_dvec3() + 0.5 - center).length();

                if d < r && (s == 0.0 || d > s) {
                    let mut band = (r - d).min(1.0);
                    if s > 0.0 {
                        band = band.min(d - s);
                    }
                    let content = ((255.0 * band).round() as u8).max(1);
                    volume.set_cell(p, Cell::new(content, outer));
                } else if s > 0.0 && d < s {
                    volume.set_cell(p, Cell::new(0, inner));
                }
            }
        }
    }

    log::debug!(
        "built sphere r={} shell={} in {} grid, {} filled cells",
        spec.radius,
        spec.shell_radius,
        size,
        volume.filled_cell_count(),
    );
    Ok(volume)
}
