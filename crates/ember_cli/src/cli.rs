use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use ember_renderer::{Scheduler, DEFAULT_BUCKET_SIZE};
use log::LevelFilter;

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Scenes compiled into the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BuiltinScene {
    /// Random field of small spheres around three large ones
    Cover,
    /// One diffuse sphere on a ground sphere
    TwoSpheres,
    /// Diffuse, hollow glass and fuzzy metal side by side
    Materials,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchedulerArg {
    /// One task per pixel on the worker pool
    Pool,
    /// Square buckets, center first
    Buckets,
}

impl From<SchedulerArg> for Scheduler {
    fn from(arg: SchedulerArg) -> Self {
        match arg {
            SchedulerArg::Pool => Scheduler::Pool,
            SchedulerArg::Buckets => Scheduler::Buckets,
        }
    }
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "ember")]
#[command(about = "A multithreaded CPU ray tracer")]
pub struct Args {
    /// JSON scene description to render
    #[arg(long, conflicts_with = "builtin")]
    pub scene: Option<PathBuf>,

    /// Built-in scene to render when no scene file is given
    #[arg(long, value_enum)]
    pub builtin: Option<BuiltinScene>,

    /// Output file (.ppm, .png, .jpg); "-" streams PPM to stdout
    #[arg(short, long, default_value = "image.png")]
    pub output: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Width over height
    #[arg(long)]
    pub aspect_ratio: Option<f64>,

    /// Samples per pixel
    #[arg(long, short = 's')]
    pub samples: Option<u32>,

    /// Maximum ray bounces
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long, short = 'j')]
    pub threads: Option<usize>,

    /// Seed for sampling and for the random cover scene
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[arg(long, value_enum, default_value = "pool")]
    pub scheduler: SchedulerArg,

    /// Bucket edge in pixels (bucket scheduler only)
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    pub bucket_size: u32,

    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Args {
    /// Whether the image should be streamed as PPM to stdout.
    pub fn streams_to_stdout(&self) -> bool {
        self.output.as_os_str() == "-"
    }
}
