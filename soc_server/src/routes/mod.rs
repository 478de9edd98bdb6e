pub mod health;
pub mod model;
pub mod predict;

use axum::Router;

use crate::state::AppState;

/// All endpoints, not yet bound to a state value.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(model::router())
        .merge(predict::router())
}
