//! Ember math types.
//!
//! Double-precision vectors built on glam, plus the ray, interval and
//! sampling helpers the renderer is written against.

pub use glam::DVec3;

mod interval;
mod ray;
pub mod random;
mod vector;

pub use interval::Interval;
pub use ray::Ray;
pub use vector::{near_zero, reflect, refract};

/// 3D vector of `f64` components.
pub type Vec3 = DVec3;

/// A position in space.
pub type Point3 = DVec3;

/// Linear RGB color, components nominally in `[0, 1]`.
pub type Color = DVec3;
