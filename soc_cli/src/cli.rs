//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

/// Config path used when `--config` is not given; absent file means defaults.
pub const DEFAULT_CONFIG: &str = "etc/soc_config.toml";

#[derive(Parser, Debug)]
#[command(name = "soc", version, about = "Battery state-of-charge pipeline")]
pub struct Cli {
    /// Path to config TOML (typed). Defaults to etc/soc_config.toml when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit results and errors as JSON, and log as JSON lines
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten a raw battery file (.mat or .json) into the processed CSV
    Extract {
        /// Raw file (overrides paths.raw_file)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Processed CSV to write (overrides paths.processed_csv)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Top-level variable holding the battery record (default: file stem)
        #[arg(long, value_name = "NAME")]
        variable: Option<String>,
    },
    /// Print the SOC label for a mean voltage
    Label {
        /// Mean voltage in volts
        #[arg(long, allow_negative_numbers = true)]
        voltage: f64,
    },
    /// Train the SOC regressor from the processed CSV
    Train {
        /// Processed CSV (overrides paths.processed_csv)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        /// Output directory (overrides paths.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<PathBuf>,
    },
    /// Predict SOC for one feature vector with the trained model
    Predict {
        /// Comma-separated features: voltage_mean,current_mean,temperature_mean,time_max
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        features: Vec<f64>,
        /// Model directory (overrides paths.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<PathBuf>,
    },
    /// Describe the processed CSV (column stats, correlations, SOC levels)
    Summary {
        /// Processed CSV (overrides paths.processed_csv)
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Check that a model artifact loads
    Health {
        /// Model directory (overrides paths.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<PathBuf>,
    },
    /// Serve predictions over HTTP
    Serve {
        /// Bind address (overrides server.host)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (overrides server.port)
        #[arg(long)]
        port: Option<u16>,
        /// Model directory (overrides paths.model_dir)
        #[arg(long, value_name = "DIR")]
        model_dir: Option<PathBuf>,
        /// Start without a model; prediction endpoints answer 503
        #[arg(long, action = ArgAction::SetTrue)]
        allow_missing_model: bool,
    },
}
