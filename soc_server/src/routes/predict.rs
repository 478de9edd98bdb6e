use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::ApiResult;
use crate::state::AppState;
use crate::timestamp;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

/// Items stay undecoded so one bad row fails only its own slot.
#[derive(Debug, Deserialize)]
pub struct BatchPredictRequest {
    pub batch_features: Vec<Value>,
}

fn feature_row(index: usize, item: &Value) -> Result<Vec<f64>, String> {
    let Value::Array(values) = item else {
        return Err(format!("item {index}: expected an array of numbers"));
    };
    values
        .iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .ok_or_else(|| format!("item {index}: feature {j} is not a number"))
        })
        .collect()
}

async fn predict(
    State(state): State<AppState>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    // Checked before parsing so a missing model is 503 even for bad bodies.
    state.ctx.model_info()?;
    let Json(req) = body?;
    let p = state.ctx.predict(&req.features)?;
    tracing::debug!(soc = p.predicted_soc, "prediction served");
    Ok(Json(json!({
        "predicted_soc": p.predicted_soc,
        "model_name": p.model_name,
        "status": "success",
        "timestamp": timestamp(),
    })))
}

async fn batch_predict(
    State(state): State<AppState>,
    body: Result<Json<BatchPredictRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    state.ctx.model_info()?;
    let Json(req) = body?;
    let rows: Vec<Result<Vec<f64>, String>> = req
        .batch_features
        .iter()
        .enumerate()
        .map(|(i, item)| feature_row(i, item))
        .collect();
    let predictions = state
        .ctx
        .batch_predict_rows(rows.iter().map(|r| r.as_deref().map_err(Clone::clone)))?;
    let failed = predictions.iter().filter(|p| !p.is_success()).count();
    tracing::debug!(items = predictions.len(), failed, "batch prediction served");
    Ok(Json(json!({
        "predictions": predictions,
        "count": predictions.len(),
        "status": "success",
        "timestamp": timestamp(),
    })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/predict", post(predict))
        .route("/batch-predict", post(batch_predict))
}
