use super::words::{self, WordSource};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Header the client uses to tag each request with its task index
pub const TASK_INDEX_HEADER: &str = "x-task-index";

/// Shared state for the generator API
pub struct GeneratorState {
    pub words: Arc<dyn WordSource>,
    pub max_paragraphs: u32,
    pub max_words: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub paragraphs: u32,
    pub words: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub paragraphs: Vec<String>,
}

/// POST /lorem
pub async fn generate_lorem(
    State(state): State<Arc<GeneratorState>>,
    headers: HeaderMap,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Result<Json<GenerationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let task_index = headers
        .get(TASK_INDEX_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    info!(
        task_index = %task_index,
        paragraphs = request.paragraphs,
        words = request.words,
        "Incoming generation request"
    );

    if request.paragraphs > state.max_paragraphs {
        return Err(ApiError::BadRequest(format!(
            "paragraphs must be at most {}, got {}",
            state.max_paragraphs, request.paragraphs
        )));
    }
    if request.words > state.max_words {
        return Err(ApiError::BadRequest(format!(
            "words must be at most {}, got {}",
            state.max_words, request.words
        )));
    }

    let source = state.words.clone();
    let paragraphs = tokio::task::spawn_blocking(move || {
        words::generate(source.as_ref(), request.paragraphs, request.words)
    })
    .await
    .map_err(|e| {
        error!(task_index = %task_index, error = %e, "Generation failed");
        ApiError::InternalError(format!("generation failed: {}", e))
    })?;

    Ok(Json(GenerationResponse { paragraphs }))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
