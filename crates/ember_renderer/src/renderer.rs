//! Core path tracing renderer.
//!
//! Implements Monte Carlo ray tracing with:
//! - Recursive ray tracing with a bounce budget
//! - Anti-aliasing via jittered multi-sampling
//! - Gamma correction and 8-bit quantization
//! - Deterministic per-pixel random streams, so every scheduler and every
//!   thread count produce the same image for the same seed

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::bucket::{generate_buckets, render_bucket, DEFAULT_BUCKET_SIZE};
use crate::error::{ConfigError, RenderError, RenderResult};
use crate::{pool, Camera, Framebuffer, HitRecord, Hittable};
use ember_math::{Color, Interval, Ray};
use log::{debug, error, info};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

/// Closest parameter accepted for a hit; keeps scattered rays from
/// re-hitting the surface they leave.
const SHADOW_ACNE_EPSILON: f64 = 0.001;

/// Color range written to 8-bit channels.
const INTENSITY: Interval = Interval::new(0.0, 0.999);

/// How pixels are distributed over worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheduler {
    /// One task per pixel on a fixed-size worker pool.
    #[default]
    Pool,
    /// Square buckets rendered in parallel with rayon, center first.
    Buckets,
}

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Worker threads; `None` uses the available hardware concurrency
    pub threads: Option<usize>,
    /// Seed for the per-pixel random streams
    pub seed: u64,
    pub scheduler: Scheduler,
    /// Edge length of a bucket in pixels (bucket scheduler only)
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: None,
            seed: 0,
            scheduler: Scheduler::Pool,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Compute the color seen by a ray.
///
/// Misses return the sky gradient. A hit costs one unit of `depth`; once
/// the budget is spent the hit contributes black, so `depth == 0` still
/// shows the background wherever primary rays escape.
pub fn ray_color(ray: &Ray, world: &dyn Hittable, depth: u32, rng: &mut dyn RngCore) -> Color {
    let mut rec = HitRecord::default();

    if !world.hit(ray, Interval::new(SHADOW_ACNE_EPSILON, f64::INFINITY), &mut rec) {
        return sky_gradient(ray);
    }

    if depth == 0 {
        return Color::ZERO;
    }

    match rec.material.scatter(ray, &rec, rng) {
        Some(result) => result.attenuation * ray_color(&result.scattered, world, depth - 1, rng),
        None => Color::ZERO,
    }
}

/// Sky gradient background: white at the horizon, blue overhead.
pub fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f64) -> f64 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Inverse of [`linear_to_gamma`].
#[inline]
pub fn gamma_to_linear(gamma: f64) -> f64 {
    gamma * gamma
}

/// Convert a linear color to gamma-corrected 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let quantize = |c: f64| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Independent random stream for one pixel.
///
/// Depends only on the render seed and the pixel's row-major index, never
/// on which thread happens to run the pixel.
pub fn pixel_rng(seed: u64, pixel_index: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ pixel_index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Render a single pixel: the mean of `samples_per_pixel` traced samples.
pub fn render_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
    let mut pixel_color = Color::ZERO;

    for _ in 0..camera.samples_per_pixel() {
        let ray = camera.get_ray(x, y, rng);
        pixel_color += ray_color(&ray, world, camera.max_depth(), rng);
    }

    pixel_color / camera.samples_per_pixel() as f64
}

/// Render and quantize pixel (x, y) with its own seeded stream.
pub(crate) fn shade_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, seed: u64) -> [u8; 3] {
    let index = y as u64 * camera.image_width() as u64 + x as u64;
    let mut rng = pixel_rng(seed, index);
    color_to_rgb8(render_pixel(camera, world, x, y, &mut rng))
}

/// Completed-pixel counter shared by render tasks; logs every tenth.
pub(crate) struct Progress {
    done: AtomicUsize,
    total: usize,
    step: usize,
}

impl Progress {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            done: AtomicUsize::new(0),
            total,
            step: (total / 10).max(1),
        }
    }

    pub(crate) fn advance(&self, pixels: usize) {
        let before = self.done.fetch_add(pixels, Ordering::Relaxed);
        let after = before + pixels;
        if after / self.step > before / self.step || after == self.total {
            info!("Rendered {}/{} pixels ({}%)", after, self.total, after * 100 / self.total.max(1));
        }
    }
}

/// Renders a scene through a camera with a chosen scheduler.
pub struct Renderer {
    camera: Camera,
    config: RenderConfig,
}

impl Renderer {
    pub fn new(camera: Camera, config: RenderConfig) -> Result<Self, ConfigError> {
        if config.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        if config.bucket_size == 0 {
            return Err(ConfigError::ZeroBucketSize);
        }
        Ok(Self { camera, config })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Worker threads this renderer will use.
    pub fn thread_count(&self) -> usize {
        self.config.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Render the whole image in parallel into a new framebuffer.
    ///
    /// The scene must be fully built; it is only read from here on.
    pub fn render(&self, world: &dyn Hittable) -> RenderResult<Framebuffer> {
        let threads = self.thread_count();
        let width = self.camera.image_width();
        let height = self.camera.image_height();
        info!(
            "Rendering {}x{} @ {} spp, depth {}, {} threads, {:?} scheduler",
            width,
            height,
            self.camera.samples_per_pixel(),
            self.camera.max_depth(),
            threads,
            self.config.scheduler
        );

        let start = Instant::now();
        let framebuffer = match self.config.scheduler {
            Scheduler::Pool => self.render_with_pool(world, threads)?,
            Scheduler::Buckets => self.render_with_buckets(world, threads)?,
        };
        info!("Rendered in {:?}", start.elapsed());

        Ok(framebuffer)
    }

    /// Render on the calling thread, emitting pixels in row-major order.
    ///
    /// Produces exactly the same pixels as [`Renderer::render`]. Stops at
    /// the first error returned by `emit`.
    pub fn render_streaming<E, F>(&self, world: &dyn Hittable, mut emit: F) -> Result<(), E>
    where
        F: FnMut(u32, u32, [u8; 3]) -> Result<(), E>,
    {
        let width = self.camera.image_width();
        let height = self.camera.image_height();

        for y in 0..height {
            debug!("Scanlines remaining: {}", height - y);
            for x in 0..width {
                emit(x, y, shade_pixel(&self.camera, world, x, y, self.config.seed))?;
            }
        }

        Ok(())
    }

    fn render_with_pool(&self, world: &dyn Hittable, threads: usize) -> RenderResult<Framebuffer> {
        let mut framebuffer = Framebuffer::new(self.camera.image_width(), self.camera.image_height());
        let progress = Progress::new(framebuffer.len());
        let camera = &self.camera;
        let progress_ref = &progress;
        let seed = self.config.seed;
        let slots = framebuffer.slots_mut();

        pool::scope(threads, move |pool| {
            for (x, y, slot) in slots {
                pool.enqueue(move || {
                    *slot = shade_pixel(camera, world, x, y, seed);
                    progress_ref.advance(1);
                });
            }
        })?;

        Ok(framebuffer)
    }

    fn render_with_buckets(&self, world: &dyn Hittable, threads: usize) -> RenderResult<Framebuffer> {
        let width = self.camera.image_width();
        let height = self.camera.image_height();
        let buckets = generate_buckets(width, height, self.config.bucket_size);
        let progress = Progress::new(width as usize * height as usize);
        let thread_pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;

        let results: Vec<_> = thread_pool.install(|| {
            buckets
                .par_iter()
                .map(|bucket| {
                    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let result = render_bucket(bucket, &self.camera, world, self.config.seed);
                        progress.advance(bucket.pixel_count() as usize);
                        result
                    }))
                    .ok()
                })
                .collect()
        });

        let failed = results.iter().filter(|r| r.is_none()).count();
        if failed > 0 {
            error!("{} of {} buckets panicked", failed, buckets.len());
            return Err(RenderError::TaskPanicked {
                failed,
                total: buckets.len(),
            });
        }

        let mut framebuffer = Framebuffer::new(width, height);
        for result in results.into_iter().flatten() {
            framebuffer.write_bucket(&result);
        }

        Ok(framebuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CameraConfig, Lambertian, Metal, Scene, Sphere};
    use ember_math::{Point3, Vec3};
    use std::sync::Arc;

    fn small_scene() -> Scene {
        let mut world = Scene::new();
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)))).unwrap(),
        ));
        world.add(Box::new(
            Sphere::new(Point3::new(1.0, 0.0, -1.0), 0.5, Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 0.3).unwrap())).unwrap(),
        ));
        world
    }

    fn small_camera() -> Camera {
        Camera::new(CameraConfig::default().with_resolution(24, 16.0 / 9.0).with_quality(4, 5)).unwrap()
    }

    #[test]
    fn test_sky_gradient() {
        let up_color = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0)));
        let down_color = sky_gradient(&Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0)));

        assert!((up_color - Color::new(0.5, 0.7, 1.0)).length() < 1e-12);
        assert!((down_color - Color::ONE).length() < 1e-12);
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-0.5), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 1e-12);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_round_trip() {
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            assert!((linear_to_gamma(gamma_to_linear(x)) - x).abs() < 1e-12);
            assert!((gamma_to_linear(linear_to_gamma(x)) - x).abs() < 1e-12);
        }
    }

    #[test]
    fn test_color_to_rgb8() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::splat(4.0)), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::splat(-1.0)), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::new(0.25, 0.0, 0.0)), [128, 0, 0]);
    }

    #[test]
    fn test_zero_depth_hit_is_black_and_miss_is_sky() {
        let world = small_scene();
        let mut rng = pixel_rng(0, 0);

        let into_sphere = Ray::new(Point3::ZERO, Vec3::NEG_Z);
        assert_eq!(ray_color(&into_sphere, &world, 0, &mut rng), Color::ZERO);

        let into_sky = Ray::new(Point3::ZERO, Vec3::Y);
        assert_eq!(ray_color(&into_sky, &world, 0, &mut rng), sky_gradient(&into_sky));
    }

    #[test]
    fn test_one_bounce_is_tinted_by_albedo() {
        let albedo = Color::new(0.1, 0.2, 0.5);
        let mut world = Scene::new();
        world.add(Box::new(Sphere::new(Point3::new(0.0, 0.0, -1.0), 0.5, Arc::new(Lambertian::new(albedo))).unwrap()));

        let mut rng = pixel_rng(3, 0);
        let color = ray_color(&Ray::new(Point3::ZERO, Vec3::NEG_Z), &world, 1, &mut rng);

        // One bounce off the sphere then the sky: never brighter than albedo
        assert!(color.x <= albedo.x + 1e-12);
        assert!(color.y <= albedo.y + 1e-12);
        assert!(color.z <= albedo.z + 1e-12);
        assert!(color.z > 0.0);
    }

    #[test]
    fn test_render_pixel_hits_sphere() {
        let world = small_scene();
        let camera = small_camera();
        let mut rng = pixel_rng(42, 0);

        let center = render_pixel(&camera, &world, 12, 6, &mut rng);
        let sky = render_pixel(&camera, &world, 0, 0, &mut rng);
        assert!(center.length() > 0.0);
        assert!(center.length() < sky.length());
    }

    #[test]
    fn test_pixel_rng_streams_differ() {
        let mut a = pixel_rng(7, 0);
        let mut b = pixel_rng(7, 1);
        let mut c = pixel_rng(7, 0);
        let first = a.next_u64();
        assert_ne!(first, b.next_u64());
        assert_eq!(first, c.next_u64());
    }

    #[test]
    fn test_renderer_rejects_zero_threads_and_buckets() {
        let config = RenderConfig {
            threads: Some(0),
            ..RenderConfig::default()
        };
        assert!(matches!(Renderer::new(small_camera(), config), Err(ConfigError::ZeroThreads)));

        let config = RenderConfig {
            bucket_size: 0,
            ..RenderConfig::default()
        };
        assert!(matches!(Renderer::new(small_camera(), config), Err(ConfigError::ZeroBucketSize)));
    }

    #[test]
    fn test_schedulers_and_streaming_agree() {
        let world = small_scene();
        let pool = Renderer::new(small_camera(), RenderConfig { threads: Some(3), seed: 11, ..RenderConfig::default() })
            .unwrap()
            .render(&world)
            .unwrap();

        let buckets = Renderer::new(
            small_camera(),
            RenderConfig {
                threads: Some(2),
                seed: 11,
                scheduler: Scheduler::Buckets,
                bucket_size: 5,
            },
        )
        .unwrap()
        .render(&world)
        .unwrap();

        let streaming_renderer =
            Renderer::new(small_camera(), RenderConfig { seed: 11, ..RenderConfig::default() }).unwrap();
        let mut streamed = Framebuffer::new(pool.width(), pool.height());
        streaming_renderer
            .render_streaming(&world, |x, y, rgb| -> Result<(), ()> {
                streamed.set(x, y, rgb);
                Ok(())
            })
            .unwrap();

        assert_eq!(pool.as_bytes(), buckets.as_bytes());
        assert_eq!(pool.as_bytes(), streamed.as_bytes());
    }

    #[test]
    fn test_streaming_stops_on_first_error() {
        let world = small_scene();
        let renderer = Renderer::new(small_camera(), RenderConfig::default()).unwrap();
        let mut emitted = 0;

        let result = renderer.render_streaming(&world, |_, _, _| {
            emitted += 1;
            if emitted == 3 {
                Err("disk full")
            } else {
                Ok(())
            }
        });

        assert_eq!(result, Err("disk full"));
        assert_eq!(emitted, 3);
    }

    #[test]
    fn test_progress_reaches_total() {
        let progress = Progress::new(25);
        for _ in 0..25 {
            progress.advance(1);
        }
        assert_eq!(progress.done.load(Ordering::Relaxed), 25);
    }
}
