use std::sync::Arc;

use soc_core::ServingContext;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cloning is cheap; the serving context is immutable and shared without locks.
#[derive(Clone, Debug)]
pub struct AppState {
    pub ctx: Arc<ServingContext>,
}

impl AppState {
    pub fn new(ctx: ServingContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}
