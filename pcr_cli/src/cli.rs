//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config file used when `--config` is not given; missing means built-in defaults.
pub const DEFAULT_CONFIG: &str = "etc/pcr_config.toml";

#[derive(Parser, Debug)]
#[command(name = "pcr", version, about = "Light-intensity PCR reader")]
pub struct Cli {
    /// Path to config TOML (typed); defaults to etc/pcr_config.toml when present
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override storage.resource_dir (one YAML document per experiment)
    #[arg(long, value_name = "DIR")]
    pub resources: Option<PathBuf>,

    /// Log and print results as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List experiments; the current one is marked with `*`
    List,
    /// Create an experiment from the template and make it current
    Create { name: String },
    /// Delete an experiment and its document
    Remove { name: String },
    /// Print an experiment's settings, samples and curve results
    Show {
        /// Defaults to the current experiment
        name: Option<String>,
    },
    /// Make an experiment current
    Select { name: String },
    /// Change experiment settings
    Set(SetArgs),
    /// Edit the standard curve
    Curve {
        /// Defaults to the current experiment
        #[arg(long, value_name = "NAME")]
        experiment: Option<String>,
        #[command(subcommand)]
        action: CurveCmd,
    },
    /// Refit the standard curve and save
    Analyze {
        /// Defaults to the current experiment
        name: Option<String>,
    },
    /// Acquire one full run on an experiment, finalize and save it
    Run {
        /// Defaults to the current experiment
        #[arg(long, value_name = "NAME")]
        experiment: Option<String>,
    },
    /// Quick health check (sensor presence / sim ok)
    SelfCheck,
}

#[derive(Args, Debug, Default)]
pub struct SetArgs {
    /// Defaults to the current experiment
    #[arg(long, value_name = "NAME")]
    pub experiment: Option<String>,
    /// Intensity a sample must reach to mark the cycle threshold
    #[arg(long, value_name = "LUX")]
    pub intensity_threshold: Option<f64>,
    /// LED drive level (0..=hardware.led_max_level)
    #[arg(long, value_name = "LEVEL")]
    pub led_level: Option<i64>,
    #[arg(long, value_name = "FACTOR", allow_negative_numbers = true)]
    pub multiplier: Option<f64>,
    /// Decimal text, stored as typed
    #[arg(long, value_name = "DECIMAL", allow_negative_numbers = true)]
    pub coefficient: Option<String>,
    /// Cycle cap; the sample buffer is resized to match
    #[arg(long, value_name = "N")]
    pub max_cycle: Option<i64>,
}

impl SetArgs {
    pub fn is_empty(&self) -> bool {
        self.intensity_threshold.is_none()
            && self.led_level.is_none()
            && self.multiplier.is_none()
            && self.coefficient.is_none()
            && self.max_cycle.is_none()
    }
}

#[derive(Subcommand, Debug)]
pub enum CurveCmd {
    /// Append a dilution point
    Add {
        /// log10 of the dilution factor
        #[arg(allow_negative_numbers = true)]
        log_dilution: f64,
        /// Cycle threshold measured for that dilution
        ct: i64,
    },
    /// Remove the point at INDEX (0-based, insertion order)
    Remove { index: usize },
    /// Remove every point
    Clear,
    /// Append points from a CSV with headers `log_dilution,ct`
    Import {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}
