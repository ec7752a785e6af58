//! Material trait for surface scattering.

use crate::{error::ConfigError, hittable::HitRecord};
use ember_math::random::{gen_f64, random_unit_vector};
use ember_math::{near_zero, reflect, refract, Color, Ray};
use rand::RngCore;

/// Result of a successful scatter: how much light survives and where it goes next.
#[derive(Debug, Clone, Copy)]
pub struct ScatterResult {
    pub attenuation: Color,
    pub scattered: Ray,
}

/// Trait for materials that describe how light interacts with surfaces.
pub trait Material: Send + Sync {
    /// Scatter an incoming ray.
    ///
    /// Returns `Some` if the ray scatters, or `None` if it is absorbed.
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult>;
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    albedo: Color,
}

impl Lambertian {
    /// Create a new Lambertian material with the given albedo color.
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn albedo(&self) -> Color {
        self.albedo
    }
}

impl Material for Lambertian {
    fn scatter(&self, _ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut scatter_direction = rec.normal + random_unit_vector(rng);

        // Catch degenerate scatter direction
        if near_zero(scatter_direction) {
            scatter_direction = rec.normal;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, scatter_direction),
        })
    }
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    albedo: Color,
    fuzz: f64,
}

impl Metal {
    /// Create a new Metal material.
    ///
    /// - `albedo`: The color of the metal
    /// - `fuzz`: Roughness in `[0, 1]`, 0.0 = perfect mirror
    pub fn new(albedo: Color, fuzz: f64) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&fuzz) {
            return Err(ConfigError::InvalidFuzz(fuzz));
        }
        Ok(Self { albedo, fuzz })
    }

    pub fn fuzz(&self) -> f64 {
        self.fuzz
    }
}

impl Material for Metal {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let mut direction = reflect(ray_in.direction().normalize(), rec.normal);
        if self.fuzz > 0.0 {
            direction += self.fuzz * random_unit_vector(rng);
        }

        // Absorbed when fuzz pushes the reflection below the surface
        if direction.dot(rec.normal) <= 0.0 {
            return None;
        }

        Some(ScatterResult {
            attenuation: self.albedo,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Refractive index in vacuum or air, or the ratio of the material's
    /// index over the index of the enclosing medium
    refraction_index: f64,
}

impl Dielectric {
    /// Create a new Dielectric material.
    ///
    /// - `refraction_index`: 1.0 = air, 1.5 = glass, 2.4 = diamond
    pub fn new(refraction_index: f64) -> Result<Self, ConfigError> {
        if !(refraction_index.is_finite() && refraction_index > 0.0) {
            return Err(ConfigError::InvalidRefractiveIndex(refraction_index));
        }
        Ok(Self { refraction_index })
    }

    pub fn refraction_index(&self) -> f64 {
        self.refraction_index
    }

    /// Schlick's approximation for reflectance.
    pub fn reflectance(cosine: f64, refraction_index: f64) -> f64 {
        let r0 = ((1.0 - refraction_index) / (1.0 + refraction_index)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
    }
}

impl Material for Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn RngCore) -> Option<ScatterResult> {
        let ri = if rec.front_face {
            1.0 / self.refraction_index
        } else {
            self.refraction_index
        };

        let unit_direction = ray_in.direction().normalize();
        let cos_theta = (-unit_direction).dot(rec.normal).min(1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

        let cannot_refract = ri * sin_theta > 1.0;
        let direction = if cannot_refract || Self::reflectance(cos_theta, ri) > gen_f64(rng) {
            reflect(unit_direction, rec.normal)
        } else {
            refract(unit_direction, rec.normal, ri)
        };

        Some(ScatterResult {
            attenuation: Color::ONE,
            scattered: Ray::new(rec.p, direction),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_math::{Point3, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record_facing(normal: Vec3, front_face: bool, material: &dyn Material) -> HitRecord<'_> {
        HitRecord {
            p: Point3::ZERO,
            normal,
            material,
            t: 1.0,
            front_face,
        }
    }

    #[test]
    fn test_lambertian_always_scatters_into_normal_hemisphere() {
        let albedo = Color::new(0.1, 0.2, 0.5);
        let material = Lambertian::new(albedo);
        let rec = record_facing(Vec3::Y, true, &material);
        let ray_in = Ray::new(Point3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..500 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(result.attenuation, albedo);
            assert!(result.scattered.direction().dot(rec.normal) >= 0.0);
            assert!(!near_zero(result.scattered.direction()));
            assert_eq!(result.scattered.origin(), rec.p);
        }
    }

    /// Replays a fixed sequence of raw `u64` draws.
    struct ScriptedRng {
        draws: Vec<u64>,
        next: usize,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let draw = self.draws[self.next % self.draws.len()];
            self.next += 1;
            draw
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            rand_core::impls::fill_bytes_via_next(self, dest)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn test_lambertian_falls_back_to_normal_when_bounce_cancels() {
        // Draws of 0.5, 0.0, 0.5 map to (0, -1, 0) in random_unit_vector,
        // which exactly cancels the +y normal
        let mut rng = ScriptedRng {
            draws: vec![1 << 63, 0, 1 << 63],
            next: 0,
        };
        assert_eq!(random_unit_vector(&mut rng), Vec3::NEG_Y);
        rng.next = 0;

        let material = Lambertian::new(Color::ONE);
        let rec = record_facing(Vec3::Y, true, &material);
        let ray_in = Ray::new(Point3::new(0.0, 1.0, 0.0), Vec3::NEG_Y);

        let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert_eq!(result.scattered.direction(), rec.normal);
        assert_eq!(result.scattered.origin(), rec.p);
    }

    #[test]
    fn test_metal_without_fuzz_is_a_mirror() {
        let albedo = Color::new(0.8, 0.6, 0.2);
        let material = Metal::new(albedo, 0.0).unwrap();
        let rec = record_facing(Vec3::Z, true, &material);
        let ray_in = Ray::new(Point3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -2.0));
        let mut rng = StdRng::seed_from_u64(2);

        let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert_eq!(result.attenuation, albedo);
        assert_eq!(result.scattered.direction(), Vec3::Z);

        // No randomness is involved: a second call gives the identical ray
        let again = material.scatter(&ray_in, &rec, &mut rng).unwrap();
        assert_eq!(again.scattered, result.scattered);
    }

    #[test]
    fn test_metal_absorbs_grazing_fuzzy_reflections() {
        let material = Metal::new(Color::ONE, 1.0).unwrap();
        let rec = record_facing(Vec3::Y, true, &material);
        // Nearly grazing: reflection hugs the surface, fuzz pushes some below it
        let ray_in = Ray::new(Point3::new(-1.0, 0.01, 0.0), Vec3::new(1.0, -0.01, 0.0));
        let mut rng = StdRng::seed_from_u64(3);

        let absorbed = (0..1000)
            .filter(|_| material.scatter(&ray_in, &rec, &mut rng).is_none())
            .count();
        assert!(absorbed > 0);
        assert!(absorbed < 1000);
    }

    #[test]
    fn test_metal_rejects_out_of_range_fuzz() {
        assert_eq!(Metal::new(Color::ONE, 1.5).unwrap_err(), ConfigError::InvalidFuzz(1.5));
        assert!(Metal::new(Color::ONE, -0.1).is_err());
        assert!(Metal::new(Color::ONE, f64::NAN).is_err());
        assert!(Metal::new(Color::ONE, 1.0).is_ok());
    }

    #[test]
    fn test_dielectric_rejects_bad_index() {
        assert!(Dielectric::new(0.0).is_err());
        assert!(Dielectric::new(-1.5).is_err());
        assert!(Dielectric::new(f64::INFINITY).is_err());
        assert!(Dielectric::new(1.5).is_ok());
    }

    #[test]
    fn test_schlick_is_minimal_at_normal_incidence() {
        let head_on = Dielectric::reflectance(1.0, 1.0 / 1.5);
        assert!((head_on - 0.04).abs() < 1e-9);
        assert!(Dielectric::reflectance(0.2, 1.0 / 1.5) > head_on);
        assert!((Dielectric::reflectance(0.0, 1.0 / 1.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_dielectric_head_on_mostly_refracts() {
        let material = Dielectric::new(1.5).unwrap();
        let rec = record_facing(Vec3::Z, true, &material);
        let ray_in = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        let mut rng = StdRng::seed_from_u64(4);

        let trials = 10_000;
        let mut refracted = 0;
        for _ in 0..trials {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert_eq!(result.attenuation, Color::ONE);
            // Refraction at normal incidence keeps going; reflection turns back
            if result.scattered.direction().z < 0.0 {
                refracted += 1;
            }
        }

        let fraction = refracted as f64 / trials as f64;
        assert!(fraction > 0.93 && fraction < 0.99, "refracted fraction {fraction}");
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let material = Dielectric::new(1.5).unwrap();
        // Exiting the glass (back face) at a steep angle: sin > 1/1.5
        let rec = record_facing(Vec3::Y, false, &material);
        let ray_in = Ray::new(Point3::new(-1.0, 0.2, 0.0), Vec3::new(1.0, -0.2, 0.0));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..100 {
            let result = material.scatter(&ray_in, &rec, &mut rng).unwrap();
            assert!(result.scattered.direction().y > 0.0);
        }
    }
}
