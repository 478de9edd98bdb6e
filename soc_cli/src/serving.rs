//! Model-facing commands: predict, health, serve.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use eyre::WrapErr;
use serde_json::json;
use soc_config::Config;
use soc_core::{ServingContext, SocError};

use crate::output::emit;

pub fn run_predict(
    cfg: &Config,
    features: &[f64],
    model_dir: Option<PathBuf>,
) -> eyre::Result<()> {
    let dir = model_dir.unwrap_or_else(|| cfg.paths.model_dir.clone());
    let ctx = ServingContext::load(&dir)?;
    let p = ctx.predict(features)?;
    emit(
        &json!({
            "command": "predict",
            "features": features,
            "predicted_soc": p.predicted_soc,
            "model_name": p.model_name,
        }),
        || format!("Predicted SOC: {:.2}% ({})", p.predicted_soc, p.model_name),
    );
    Ok(())
}

/// Succeeds only when the artifact loads; the error carries the reason otherwise.
pub fn run_health(cfg: &Config, model_dir: Option<PathBuf>) -> eyre::Result<()> {
    let dir = model_dir.unwrap_or_else(|| cfg.paths.model_dir.clone());
    let ctx = ServingContext::load(&dir)?;
    let info = ctx.model_info()?;
    emit(
        &json!({
            "command": "health",
            "status": "healthy",
            "model_dir": dir.display().to_string(),
            "model_name": info.best_model_name,
            "feature_names": info.feature_names,
            "metrics": info.metrics,
        }),
        || {
            format!(
                "healthy: {} ({} features, r2={})",
                info.best_model_name,
                info.feature_names.len(),
                info.metrics.r2
            )
        },
    );
    Ok(())
}

pub fn run_serve(
    cfg: &Config,
    host: Option<String>,
    port: Option<u16>,
    model_dir: Option<PathBuf>,
    allow_missing_model: bool,
) -> eyre::Result<()> {
    let dir = model_dir.unwrap_or_else(|| cfg.paths.model_dir.clone());
    let host = host.unwrap_or_else(|| cfg.server.host.clone());
    let port = port.unwrap_or(cfg.server.port);
    let ip: IpAddr = host
        .parse()
        .wrap_err_with(|| format!("invalid server host {host:?}"))?;
    let addr = SocketAddr::new(ip, port);

    let ctx = match ServingContext::load(&dir) {
        Ok(ctx) => ctx,
        Err(SocError::ModelArtifactMissing(path)) if allow_missing_model => {
            tracing::warn!(%path, "model artifact missing; serving without a model");
            ServingContext::unloaded()
        }
        Err(e) => return Err(e.into()),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("build tokio runtime")?;
    runtime
        .block_on(soc_server::serve(soc_server::AppState::new(ctx), addr))
        .wrap_err_with(|| format!("serve on {addr}"))?;
    Ok(())
}
