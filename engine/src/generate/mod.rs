//! Procedural source volumes.

pub mod sphere;

pub use sphere::{build_sphere, SphereSpec, SPHERE_MARGIN};
