//! Error types for configuration, scene loading and rendering.

use thiserror::Error;

/// A configuration value that would make the render meaningless.
///
/// Raised before any pixel is traced so a bad setting never turns into a
/// NaN or a blank image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("image width must be at least 1 pixel")]
    ZeroWidth,

    #[error("aspect ratio must be positive and finite, got {0}")]
    InvalidAspectRatio(f64),

    #[error("a {width}x{height} RGB image does not fit in memory")]
    ImageTooLarge { width: u32, height: u32 },

    #[error("samples per pixel must be at least 1")]
    ZeroSamples,

    #[error("vertical field of view must lie strictly between 0 and 180 degrees, got {0}")]
    InvalidFieldOfView(f64),

    #[error("focus distance must be positive and finite, got {0}")]
    InvalidFocusDistance(f64),

    #[error("defocus angle must lie in [0, 180) degrees, got {0}")]
    InvalidDefocusAngle(f64),

    #[error("look-from and look-at points coincide")]
    ZeroViewDirection,

    #[error("up vector is zero or parallel to the view direction")]
    DegenerateUpVector,

    #[error("{0} must have finite components")]
    NonFiniteVector(&'static str),

    #[error("sphere radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    #[error("metal fuzz must lie in [0, 1], got {0}")]
    InvalidFuzz(f64),

    #[error("refractive index must be positive and finite, got {0}")]
    InvalidRefractiveIndex(f64),

    #[error("worker pool needs at least one thread")]
    ZeroThreads,

    #[error("bucket size must be at least 1 pixel")]
    ZeroBucketSize,
}

/// Errors that can occur while loading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sphere {index} references unknown material '{name}'")]
    UnknownMaterial { index: usize, name: String },

    #[error("invalid material '{name}': {source}")]
    InvalidMaterial { name: String, source: ConfigError },

    #[error("invalid sphere {index}: {source}")]
    InvalidSphere { index: usize, source: ConfigError },

    #[error("invalid camera: {0}")]
    InvalidCamera(ConfigError),
}

/// Errors that can occur while rendering or writing an image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("{failed} of {total} render tasks panicked")]
    TaskPanicked { failed: usize, total: usize },

    #[error("failed to start render threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported output format '{0}' (expected .ppm, .png, .jpg or .jpeg)")]
    UnsupportedFormat(String),
}

/// Result type for scene loading.
pub type SceneResult<T> = Result<T, SceneError>;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
