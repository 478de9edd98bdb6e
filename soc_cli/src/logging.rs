//! Tracing subscriber setup: console layer plus optional JSON-lines file sink.

use eyre::WrapErr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// Install the global subscriber.
///
/// Level precedence: `--log-level`, then `RUST_LOG`, then `logging.level`, then `info`.
/// Console output goes to stderr so stdout stays machine-readable.
pub fn init_tracing(
    json: bool,
    cli_level: Option<&str>,
    cfg: &soc_config::Logging,
) -> eyre::Result<()> {
    let filter = match cli_level {
        Some(level) => EnvFilter::try_new(level)
            .wrap_err_with(|| format!("invalid --log-level {level:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(cfg.level.as_deref().unwrap_or("info"))
        }),
    };

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let console_pretty = (!json).then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let file_layer = match cfg.file.as_deref() {
        Some(path) => {
            let path = std::path::Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {path:?}"))?;
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("create log directory {dir:?}"))?;
            let appender = match cfg.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(fmt::layer().json().with_ansi(false).with_writer(writer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_json)
        .with(console_pretty)
        .with(file_layer)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(())
}
