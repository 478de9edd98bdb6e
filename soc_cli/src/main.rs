#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `soc`: battery SOC pipeline CLI.

mod cli;
mod error_fmt;
mod logging;
mod output;
mod pipeline;
mod serving;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use soc_config::Config;

use crate::cli::{Cli, Commands, DEFAULT_CONFIG, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

/// Read and validate the config. An explicit path must exist; the default may be absent.
fn load_config(explicit: Option<&Path>) -> eyre::Result<Config> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG));
    if explicit.is_none() && !path.exists() {
        return Ok(Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config file {}", path.display()))?;
    let cfg = soc_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("invalid configuration in {}: {e}", path.display()))?;
    cfg.validate()
        .map_err(|e| eyre::eyre!("invalid configuration in {}: {e}", path.display()))?;
    Ok(cfg)
}

fn run(cli: Cli) -> eyre::Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = ?cli.config, "configuration loaded");

    match cli.cmd {
        Commands::Extract {
            input,
            output,
            variable,
        } => pipeline::run_extract(&cfg, input, output, variable),
        Commands::Label { voltage } => {
            pipeline::run_label(voltage);
            Ok(())
        }
        Commands::Train { input, model_dir } => pipeline::run_train(&cfg, input, model_dir),
        Commands::Predict {
            features,
            model_dir,
        } => serving::run_predict(&cfg, &features, model_dir),
        Commands::Summary { input } => pipeline::run_summary(&cfg, input),
        Commands::Health { model_dir } => serving::run_health(&cfg, model_dir),
        Commands::Serve {
            host,
            port,
            model_dir,
            allow_missing_model,
        } => serving::run_serve(&cfg, host, port, model_dir, allow_missing_model),
    }
}

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    if let Err(e) = color_eyre::install() {
        eprintln!("warning: failed to install error report handler: {e}");
    }

    if let Err(err) = run(cli) {
        if output::json_mode() {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        tracing::debug!(error = ?err, "command failed");
        std::process::exit(exit_code_for_error(&err));
    }
}
