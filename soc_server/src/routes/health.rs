use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::state::AppState;
use crate::timestamp;

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Battery SOC Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "GET - Health check",
            "/model-info": "GET - Model metadata",
            "/features": "GET - Expected feature names and order",
            "/predict": "POST - Predict SOC for one feature vector",
            "/batch-predict": "POST - Predict SOC for several feature vectors",
        },
        "status": "success",
        "timestamp": timestamp(),
    }))
}

/// Always 200; `status` tells whether a model is loaded.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let h = state.ctx.health();
    let mut body = json!({
        "status": if h.loaded { "healthy" } else { "unhealthy" },
        "model_loaded": h.loaded,
        "timestamp": timestamp(),
    });
    if let (Some(name), Some(metrics)) = (h.model_name, h.metrics) {
        body["model_name"] = json!(name);
        body["model_metrics"] = json!(metrics);
    }
    Json(body)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}
