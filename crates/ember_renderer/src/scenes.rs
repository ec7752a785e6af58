//! Built-in demo scenes.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::{CameraConfig, Dielectric, Lambertian, Material, Metal, Scene, Sphere};
use ember_math::random::{gen_f64, gen_range, random_vec3};
use ember_math::{Color, Point3, Vec3};
use rand::RngCore;

/// A scene together with the camera it was composed for.
pub struct SceneSetup {
    pub world: Scene,
    pub camera: CameraConfig,
}

fn add_sphere(world: &mut Scene, center: Point3, radius: f64, material: &Arc<dyn Material>) -> Result<(), ConfigError> {
    world.add(Box::new(Sphere::new(center, radius, Arc::clone(material))?));
    Ok(())
}

/// A small diffuse sphere resting on a large ground sphere, seen from the
/// default camera.
pub fn two_spheres() -> Result<SceneSetup, ConfigError> {
    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)));
    let center: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)));

    let mut world = Scene::new();
    add_sphere(&mut world, Point3::new(0.0, -100.5, -1.0), 100.0, &ground)?;
    add_sphere(&mut world, Point3::new(0.0, 0.0, -1.0), 0.5, &center)?;

    Ok(SceneSetup {
        world,
        camera: CameraConfig::default(),
    })
}

/// One sphere per material kind, including a hollow glass bubble, with a
/// shallow depth of field.
pub fn materials() -> Result<SceneSetup, ConfigError> {
    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.8, 0.8, 0.0)));
    let center: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.1, 0.2, 0.5)));
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5)?);
    let bubble: Arc<dyn Material> = Arc::new(Dielectric::new(1.0 / 1.5)?);
    let metal: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.8, 0.6, 0.2), 1.0)?);

    let mut world = Scene::new();
    add_sphere(&mut world, Point3::new(0.0, -100.5, -1.0), 100.0, &ground)?;
    add_sphere(&mut world, Point3::new(0.0, 0.0, -1.2), 0.5, &center)?;
    add_sphere(&mut world, Point3::new(-1.0, 0.0, -1.0), 0.5, &glass)?;
    add_sphere(&mut world, Point3::new(-1.0, 0.0, -1.0), 0.4, &bubble)?;
    add_sphere(&mut world, Point3::new(1.0, 0.0, -1.0), 0.5, &metal)?;

    let camera = CameraConfig::default()
        .with_position(Point3::new(-2.0, 2.0, 1.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y)
        .with_lens(20.0, 10.0, 3.4);

    Ok(SceneSetup { world, camera })
}

/// The cover scene: a field of small random spheres around three large ones.
///
/// Layout and material choices are drawn from `rng`, so a fixed seed always
/// yields the same scene.
pub fn cover(rng: &mut dyn RngCore) -> Result<SceneSetup, ConfigError> {
    let mut world = Scene::new();

    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.5, 0.5, 0.5)));
    add_sphere(&mut world, Point3::new(0.0, -1000.0, 0.0), 1000.0, &ground)?;

    for a in -11..11 {
        for b in -11..11 {
            let choose_material = gen_f64(rng);
            let center = Point3::new(a as f64 + 0.9 * gen_f64(rng), 0.2, b as f64 + 0.9 * gen_f64(rng));

            // Keep clear of the large metal sphere
            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            let material: Arc<dyn Material> = if choose_material < 0.8 {
                let albedo = random_vec3(rng, 0.0, 1.0) * random_vec3(rng, 0.0, 1.0);
                Arc::new(Lambertian::new(albedo))
            } else if choose_material < 0.95 {
                let albedo = random_vec3(rng, 0.5, 1.0);
                let fuzz = gen_range(rng, 0.0, 0.5);
                Arc::new(Metal::new(albedo, fuzz)?)
            } else {
                Arc::new(Dielectric::new(1.5)?)
            };
            add_sphere(&mut world, center, 0.2, &material)?;
        }
    }

    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5)?);
    add_sphere(&mut world, Point3::new(0.0, 1.0, 0.0), 1.0, &glass)?;

    let brown: Arc<dyn Material> = Arc::new(Lambertian::new(Color::new(0.4, 0.2, 0.1)));
    add_sphere(&mut world, Point3::new(-4.0, 1.0, 0.0), 1.0, &brown)?;

    let mirror: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)?);
    add_sphere(&mut world, Point3::new(4.0, 1.0, 0.0), 1.0, &mirror)?;

    let camera = CameraConfig::default()
        .with_resolution(1280, 16.0 / 9.0)
        .with_quality(150, 50)
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);

    Ok(SceneSetup { world, camera })
}
