use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::timestamp;

async fn model_info(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let info = state.ctx.model_info()?;
    Ok(Json(json!({
        "model_info": info,
        "feature_count": info.feature_names.len(),
        "feature_names": info.feature_names,
        "status": "success",
        "timestamp": timestamp(),
    })))
}

async fn features(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let names = state.ctx.feature_names()?;
    Ok(Json(json!({
        "feature_names": names,
        "feature_count": names.len(),
        "status": "success",
        "timestamp": timestamp(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/model-info", get(model_info))
        .route("/features", get(features))
}
