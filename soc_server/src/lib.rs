#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! HTTP layer over `soc_core::ServingContext`.
//!
//! [`router`] builds the full application so the `soc serve` command and
//! integration tests use the same middleware stack.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// RFC 3339 UTC timestamp stamped on every response body.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Apply the middleware stack (bottom-up: tracing, then panic recovery).
pub fn with_middleware(app: Router) -> Router {
    app
        // Panic recovery: catch panics and return a 500 JSON body.
        .layer(CatchPanicLayer::custom(error::panic_response))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The complete application router.
pub fn router(state: AppState) -> Router {
    with_middleware(routes::api_routes().with_state(state))
}

/// Bind `addr` and serve until SIGINT or SIGTERM.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        model_loaded = state.ctx.is_loaded(),
        "SOC API listening"
    );
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
