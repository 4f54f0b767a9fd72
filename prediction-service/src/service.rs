use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    advisor::Advisor,
    models::{PredictRequest, PredictResponse},
    prompt::{build_prompt, clean_response},
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn internal_error(message: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": message })),
    )
}

#[derive(Clone)]
pub struct AppState {
    pub advisor: Arc<dyn Advisor>,
}

pub fn create_app(advisor: Arc<dyn Advisor>) -> Router {
    build_router(AppState { advisor })
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/predict", post(predict))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Clinical Prediction Service",
        "version": "1.0.0",
        "description": "Structured medical suggestions for free-text clinical queries",
        "endpoints": {
            "POST /predict": "Answer a clinical query",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> ApiResult<PredictResponse> {
    let Json(request) = payload.map_err(|e| bad_request_error(&e.body_text()))?;
    let query = validate_query(request.query)?;

    let request_id = Uuid::new_v4();
    info!(%request_id, "Received prediction query ({} chars)", query.len());

    let completion = state
        .advisor
        .advise(&build_prompt(&query))
        .await
        .map_err(|e| {
            error!(%request_id, "Prediction failed: {}", e);
            internal_error(&e.to_string())
        })?;

    info!(%request_id, "Prediction completed ({} chars)", completion.len());

    Ok(Json(PredictResponse {
        status: "success".to_string(),
        response: clean_response(&completion),
    }))
}

fn validate_query(query: Option<String>) -> Result<String, ApiError> {
    match query {
        Some(query) if !query.is_empty() => Ok(query),
        _ => Err(bad_request_error("No query provided")),
    }
}
