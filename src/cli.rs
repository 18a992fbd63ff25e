// cli.rs - Command-line interface configuration
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::core::Dimensions;

#[derive(Parser, Debug, Clone)]
#[command(name = "clip-overlay")]
#[command(about = "Detection overlay, telemetry and render-loop diagnostics", long_about = None)]
pub struct Cli {
    /// JSON configuration file; missing sections use defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Play a clip against its detections and report what the overlay drew
    Overlay(OverlayArgs),

    /// Measure a simulated render loop and print the health report
    Perf(PerfArgs),

    /// Poll host usage from /proc and show gauges
    Telemetry(TelemetryArgs),

    /// Feed a recorded stats file through the sampler
    Replay(ReplayArgs),
}

#[derive(Args, Debug, Clone)]
pub struct OverlayArgs {
    /// Detection result JSON
    pub detections: PathBuf,

    /// Drawing surface size, e.g. 800x450
    #[arg(long, default_value = "800x450")]
    pub surface: Dimensions,

    /// Intrinsic video size, e.g. 1920x1080
    #[arg(long, default_value = "1920x1080")]
    pub native: Dimensions,

    /// Clip length in seconds
    #[arg(long, default_value = "10")]
    pub duration: f64,

    /// Start with the overlay switched off
    #[arg(long = "no-overlay", default_value = "false")]
    pub no_overlay: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PerfArgs {
    /// Detection result JSON to render during the run
    #[arg(long)]
    pub detections: Option<PathBuf>,

    /// Simulated work per frame in milliseconds
    #[arg(long, default_value = "2")]
    pub work_ms: f64,

    /// Measurement window in seconds (overrides the config)
    #[arg(long)]
    pub window: Option<f64>,

    /// Run against the wall clock instead of simulated time
    #[arg(long, default_value = "false")]
    pub realtime: bool,

    /// Print the report as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TelemetryArgs {
    /// Number of polls before exiting
    #[arg(long, default_value = "3")]
    pub samples: u32,

    /// Poll interval in milliseconds (overrides the config)
    #[arg(long)]
    pub interval_ms: Option<f64>,

    /// procfs mount to read
    #[arg(long, default_value = "/proc")]
    pub proc_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// JSON array of stats snapshots
    pub recording: PathBuf,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied
    pub fn app_config(&self) -> crate::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        match &self.command {
            Command::Overlay(args) => config.overlay.enabled = !args.no_overlay,
            Command::Perf(args) => {
                if let Some(window) = args.window {
                    config.harness.window_ms = window * 1000.0;
                }
            }
            Command::Telemetry(args) => {
                if let Some(interval) = args.interval_ms {
                    config.telemetry.poll_interval_ms = interval;
                }
            }
            Command::Replay(_) => {}
        }

        config.validate()?;
        Ok(config)
    }
}
