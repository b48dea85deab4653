//! HTTP routes and handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::Uri,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use irisflow_core::{Error, ModelInfo, Prediction, N_FEATURES};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;

    Router::new()
        .route("/health", get(health_check))
        .route("/model/info", get(model_info))
        .route("/predict", post(predict))
        .route("/predict/batch", post(predict_batch))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_accuracy: Option<f64>,
    pub run_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub input: Vec<f64>,
    #[serde(flatten)]
    pub prediction: Prediction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub features: Vec<Vec<f64>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPredictResponse {
    pub count: usize,
    pub predictions: Vec<Prediction>,
}

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let info = state.models.model_info().await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        model_accuracy: info.accuracy(),
        run_id: info.run_id,
    }))
}

async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfo>, AppError> {
    Ok(Json(state.models.model_info().await?))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, AppError> {
    metrics::counter!("irisflow_requests_total", "endpoint" => "predict").increment(1);

    let Json(req) = payload?;
    if req.features.len() != N_FEATURES {
        return Err(Error::validation(format!(
            "Expected {} features, got {}",
            N_FEATURES,
            req.features.len()
        ))
        .into());
    }

    let predictor = state.models.get().await?;
    let start = Instant::now();
    let prediction = predictor.predict_single(&req.features)?;
    record_latency("predict", start);
    metrics::counter!("irisflow_predictions_total").increment(1);

    debug!(class = %prediction.class_name, "Prediction served");
    Ok(Json(PredictResponse {
        input: req.features,
        prediction,
    }))
}

async fn predict_batch(
    State(state): State<AppState>,
    payload: Result<Json<BatchPredictRequest>, JsonRejection>,
) -> Result<Json<BatchPredictResponse>, AppError> {
    metrics::counter!("irisflow_requests_total", "endpoint" => "predict_batch").increment(1);

    let Json(req) = payload?;
    let predictor = state.models.get().await?;
    let start = Instant::now();
    let predictions = predictor.predict_batch(&req.features)?;
    record_latency("predict_batch", start);
    metrics::counter!("irisflow_predictions_total").increment(predictions.len() as u64);

    debug!(count = predictions.len(), "Batch prediction served");
    Ok(Json(BatchPredictResponse {
        count: predictions.len(),
        predictions,
    }))
}

async fn metrics(State(state): State<AppState>) -> Response {
    match &state.metrics_handle {
        Some(handle) => handle.render().into_response(),
        None => AppError::not_found("metrics recorder not installed").into_response(),
    }
}

async fn fallback(uri: Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

fn record_latency(endpoint: &'static str, start: Instant) {
    metrics::histogram!("irisflow_inference_latency_us", "endpoint" => endpoint)
        .record(start.elapsed().as_micros() as f64);
}
