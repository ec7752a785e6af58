//! Ember renderer - CPU ray tracing
//!
//! A Monte Carlo ray tracer for spheres with diffuse, metal and glass
//! materials, a thin-lens camera, and a worker pool that renders every
//! pixel as an independent task.

mod bucket;
mod camera;
mod error;
mod framebuffer;
mod hittable;
mod material;
mod output;
pub mod pool;
mod renderer;
mod scene_file;
pub mod scenes;
mod sphere;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use camera::{Camera, CameraConfig};
pub use error::{ConfigError, RenderError, RenderResult, SceneError, SceneResult};
pub use framebuffer::Framebuffer;
pub use hittable::{HitRecord, Hittable, Scene};
pub use material::{Dielectric, Lambertian, Material, Metal, ScatterResult};
pub use output::{save_image, write_ppm, write_ppm_streaming, ImageFormat};
pub use renderer::{
    color_to_rgb8, gamma_to_linear, linear_to_gamma, pixel_rng, ray_color, render_pixel, sky_gradient, RenderConfig,
    Renderer, Scheduler,
};
pub use scene_file::{MaterialEntry, SceneDescription, SphereEntry};
pub use scenes::SceneSetup;
pub use sphere::Sphere;

/// Re-export the math types used throughout the public API
pub use ember_math::{Color, Interval, Point3, Ray, Vec3};
