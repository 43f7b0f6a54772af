use axum::{Json, Router, extract::State, http::StatusCode, response::{IntoResponse, Response}, routing::{get, post, delete}};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

use crate::{error::{PipelineError, StageError}, models::{GenerateRequest, GenerationResult, PipelineSnapshot, Stage}, pipeline::PipelineController};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PipelineController>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate", post(generate))
        .route("/api/generate", post(generate))
        .route("/api/pipeline", get(get_pipeline))
        .route("/api/session", delete(reset_session))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
}

pub struct ApiError {
    pub error: PipelineError,
    pub stage: Option<Stage>,
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self { Self { error, stage: None } }
}

impl From<StageError> for ApiError {
    fn from(err: StageError) -> Self { Self { error: err.error, stage: err.stage } }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.error {
            PipelineError::RateLimited { .. } | PipelineError::DuplicateTooSoon { .. } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::PromptTooShort { .. }
            | PipelineError::PromptTooLong { .. }
            | PipelineError::BlockedPhrase(_) => StatusCode::BAD_REQUEST,
            PipelineError::RefusedRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::MalformedResponse(_) | PipelineError::TransportError(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Busy => StatusCode::CONFLICT,
        };
        let body = ErrorBody { error: self.error.to_string(), stage: self.stage.map(Stage::label) };
        (status, Json(body)).into_response()
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": "product-copywriter"}))
}

pub async fn generate(State(state): State<AppState>, Json(body): Json<GenerateRequest>) -> Result<Json<GenerationResult>, ApiError> {
    tracing::info!("📝 Generation requested ({} chars, translate: {})", body.prompt.chars().count(), body.translate);
    let result = state.pipeline.submit(&body).await?;
    Ok(Json(result))
}

pub async fn get_pipeline(State(state): State<AppState>) -> Json<PipelineSnapshot> {
    Json(state.pipeline.snapshot())
}

pub async fn reset_session(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.pipeline.reset_session().await?;
    Ok(StatusCode::NO_CONTENT)
}
