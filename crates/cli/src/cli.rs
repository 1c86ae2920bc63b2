//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Time Align - camera/IMU temporal calibration by rotation cross-correlation
#[derive(Parser, Debug)]
#[command(
    name = "time-align",
    author,
    version,
    about = "Estimate the time offset between a camera and an IMU",
    long_about = "Estimates the constant delay between camera and IMU clocks.\n\n\
                  Frame-to-frame rotations from the visual tracker are correlated \n\
                  with integrated gyroscope rates over a sliding window; the \n\
                  correlation peak gives the shift to apply to IMU timestamps."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TIME_ALIGN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TIME_ALIGN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", global = true, env = "TIME_ALIGN_METRICS_PORT")]
    pub metrics_port: u16,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the time offset on a recorded dataset
    Run(RunArgs),

    /// Estimate the time offset on a synthetic sequence with a known delay
    Simulate(SimulateArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "time_align.toml",
        env = "TIME_ALIGN_CONFIG"
    )]
    pub config: PathBuf,

    /// Override dataset root folder from configuration
    #[arg(long, env = "TIME_ALIGN_DATASET")]
    pub dataset: Option<PathBuf>,

    /// Override camera folder from configuration
    #[arg(long)]
    pub camera: Option<String>,

    /// Also load this right camera folder and the stereo calibration
    #[arg(long)]
    pub right_camera: Option<String>,

    /// Maximum number of frames to feed (0 = use configuration)
    #[arg(long, default_value = "0", env = "TIME_ALIGN_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TIME_ALIGN_TIMEOUT")]
    pub timeout: u64,

    /// Read image payloads from disk instead of timestamps only
    #[arg(long)]
    pub load_images: bool,

    /// Keep going when a frame is accepted without a correlation
    /// (degenerate tracking or missing IMU data)
    #[arg(long)]
    pub require_correlation: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `simulate` command
#[derive(Parser, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of tracked frames after the bootstrap frame
    #[arg(long, default_value = "10")]
    pub frames: usize,

    /// IMU samples per frame interval
    #[arg(long, default_value = "5")]
    pub imu_per_frame: usize,

    /// Injected IMU delay in IMU ticks (negative = IMU ahead)
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub delay: i64,

    /// Rotation angle increment per frame (rad)
    #[arg(long, default_value = "0.1")]
    pub scale: f64,

    /// IMU sampling period (seconds)
    #[arg(long, default_value = "1e-9")]
    pub period: f64,

    /// Correlate at frame rate instead of IMU rate
    #[arg(long)]
    pub frame_rate: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "time_align.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
