mod cli;

use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, BuiltinScene};
use ember_renderer::{
    save_image, scenes, write_ppm_streaming, Camera, CameraConfig, RenderConfig, Renderer, Scene, SceneDescription,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Load the world and its camera from a scene file or a built-in scene.
fn load_scene(args: &Args) -> Result<(Scene, CameraConfig)> {
    if let Some(path) = &args.scene {
        let description = SceneDescription::from_path(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?;
        let world = description
            .build()
            .with_context(|| format!("Invalid scene {}", path.display()))?;
        return Ok((world, description.camera.unwrap_or_default()));
    }

    let builtin = args.builtin.unwrap_or(BuiltinScene::TwoSpheres);
    log::info!("Using built-in scene {:?}", builtin);
    let setup = match builtin {
        BuiltinScene::Cover => scenes::cover(&mut StdRng::seed_from_u64(args.seed))?,
        BuiltinScene::TwoSpheres => scenes::two_spheres()?,
        BuiltinScene::Materials => scenes::materials()?,
    };
    Ok((setup.world, setup.camera))
}

/// Command line values win over whatever the scene asked for.
fn apply_overrides(mut camera: CameraConfig, args: &Args) -> CameraConfig {
    if let Some(width) = args.width {
        camera.image_width = width;
    }
    if let Some(aspect_ratio) = args.aspect_ratio {
        camera.aspect_ratio = aspect_ratio;
    }
    if let Some(samples) = args.samples {
        camera.samples_per_pixel = samples;
    }
    if let Some(max_depth) = args.max_depth {
        camera.max_depth = max_depth;
    }
    camera
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    log::info!("Starting Ember");

    let (world, camera) = load_scene(&args)?;
    let camera = Camera::new(apply_overrides(camera, &args)).context("Invalid camera settings")?;
    let config = RenderConfig {
        threads: args.threads,
        seed: args.seed,
        scheduler: args.scheduler.into(),
        bucket_size: args.bucket_size,
    };
    let renderer = Renderer::new(camera, config).context("Invalid render settings")?;

    if args.streams_to_stdout() {
        let stdout = io::stdout();
        write_ppm_streaming(&renderer, &world, BufWriter::new(stdout.lock())).context("Failed to stream image")?;
        return Ok(());
    }

    let framebuffer = renderer.render(&world).context("Render failed")?;
    save_image(&framebuffer, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    log::info!("Done");
    Ok(())
}
