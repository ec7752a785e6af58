//! Camera configuration and ray generation.

use crate::error::ConfigError;
use ember_math::random::{random_in_unit_disk, sample_square};
use ember_math::{Point3, Ray, Vec3};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// User-facing camera settings.
///
/// Every field has a default; a scene file may set any subset of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Rendered image width in pixels
    pub image_width: u32,
    /// Ratio of image width over height
    pub aspect_ratio: f64,
    /// Random samples averaged into each pixel
    pub samples_per_pixel: u32,
    /// Maximum number of scattering bounces
    pub max_depth: u32,
    /// Vertical field of view in degrees
    pub vfov: f64,
    pub look_from: Point3,
    pub look_at: Point3,
    /// Camera-relative "up" direction
    pub vup: Vec3,
    /// Variation angle of rays through each pixel, 0 disables depth of field
    pub defocus_angle: f64,
    /// Distance from `look_from` to the plane of perfect focus
    pub focus_distance: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            image_width: 400,
            aspect_ratio: 16.0 / 9.0,
            samples_per_pixel: 10,
            max_depth: 10,
            vfov: 90.0,
            look_from: Point3::ZERO,
            look_at: Point3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_distance: 10.0,
        }
    }
}

impl CameraConfig {
    /// Set image width and aspect ratio.
    pub fn with_resolution(mut self, image_width: u32, aspect_ratio: f64) -> Self {
        self.image_width = image_width;
        self.aspect_ratio = aspect_ratio;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Point3, look_at: Point3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f64, defocus_angle: f64, focus_distance: f64) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_distance = focus_distance;
        self
    }

    /// Image height derived from width and aspect ratio, at least 1.
    pub fn image_height(&self) -> u32 {
        ((self.image_width as f64 / self.aspect_ratio) as u32).max(1)
    }

    /// Bytes in the interleaved RGB8 framebuffer, if that fits in a `u32`.
    pub fn rgb_buffer_len(&self) -> Option<u32> {
        self.image_width.checked_mul(self.image_height())?.checked_mul(3)
    }

    /// Reject settings that would yield a degenerate viewport.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image_width == 0 {
            return Err(ConfigError::ZeroWidth);
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigError::InvalidAspectRatio(self.aspect_ratio));
        }
        let height = self.image_height();
        if self.rgb_buffer_len().is_none() {
            return Err(ConfigError::ImageTooLarge {
                width: self.image_width,
                height,
            });
        }
        if self.samples_per_pixel == 0 {
            return Err(ConfigError::ZeroSamples);
        }
        if !(self.vfov > 0.0 && self.vfov < 180.0) {
            return Err(ConfigError::InvalidFieldOfView(self.vfov));
        }
        if !(self.focus_distance.is_finite() && self.focus_distance > 0.0) {
            return Err(ConfigError::InvalidFocusDistance(self.focus_distance));
        }
        if !(self.defocus_angle >= 0.0 && self.defocus_angle < 180.0) {
            return Err(ConfigError::InvalidDefocusAngle(self.defocus_angle));
        }
        if !self.look_from.is_finite() {
            return Err(ConfigError::NonFiniteVector("look_from"));
        }
        if !self.look_at.is_finite() {
            return Err(ConfigError::NonFiniteVector("look_at"));
        }
        if !self.vup.is_finite() {
            return Err(ConfigError::NonFiniteVector("vup"));
        }

        let view = self.look_from - self.look_at;
        if view.length_squared() == 0.0 {
            return Err(ConfigError::ZeroViewDirection);
        }
        if self.vup.cross(view).length_squared() <= 1e-12 * self.vup.length_squared() * view.length_squared() {
            return Err(ConfigError::DegenerateUpVector);
        }

        Ok(())
    }
}

/// Camera for generating rays into the scene.
///
/// Built once from a validated [`CameraConfig`]; all derived geometry is
/// read-only afterwards so the camera can be shared across render threads.
#[derive(Debug, Clone)]
pub struct Camera {
    config: CameraConfig,
    image_height: u32,
    /// Camera position in world space (same as look_from)
    center: Point3,
    /// World position of pixel (0, 0)
    pixel00_loc: Point3,
    /// Offset to pixel to the right
    pixel_delta_u: Vec3,
    /// Offset to pixel below
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Validate `config` and derive the viewport geometry.
    pub fn new(config: CameraConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let image_width = config.image_width;
        let image_height = config.image_height();
        let center = config.look_from;

        // Viewport dimensions use the actual pixel ratio, not the requested one
        let h = (config.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * config.focus_distance;
        let viewport_width = viewport_height * (image_width as f64 / image_height as f64);

        // Orthonormal camera frame
        let w = (config.look_from - config.look_at).normalize();
        let u = config.vup.cross(w).normalize();
        let v = w.cross(u);

        // Vectors across the horizontal and down the vertical viewport edges
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f64;
        let pixel_delta_v = viewport_v / image_height as f64;

        let viewport_upper_left =
            center - config.focus_distance * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = config.focus_distance * (config.defocus_angle / 2.0).to_radians().tan();

        Ok(Self {
            config,
            image_height,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
        })
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn image_width(&self) -> u32 {
        self.config.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.config.max_depth
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    /// Camera frame basis `(u, v, w)`: right, up, and backwards.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Center of pixel (i, j) on the focus plane.
    pub fn pixel_center(&self, i: u32, j: u32) -> Point3 {
        self.pixel00_loc + (i as f64) * self.pixel_delta_u + (j as f64) * self.pixel_delta_v
    }

    /// Generate a jittered ray for pixel (i, j), starting on the defocus disk.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = sample_square(rng);
        let pixel_sample = self.pixel00_loc
            + ((i as f64) + offset.x) * self.pixel_delta_u
            + ((j as f64) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.config.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Point3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}
