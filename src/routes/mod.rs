use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use tracing::error;

use crate::{pipeline, Config, FeatureTable, FloorReport, PipelineError};

mod floors;
mod health;

// ---

pub fn router(config: Config) -> Router {
    // ---
    Router::new()
        .merge(floors::router())
        .merge(health::router())
        .with_state(config)
}

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    BadRequest(String),
    Internal(String),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        ApiError::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        let (status, message) = match self {
            ApiError::Pipeline(e @ PipelineError::InvalidFloorSelection(_)) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            ApiError::Pipeline(e) => {
                error!("Pipeline failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Run blocking pipeline work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> crate::Result<T> + Send + 'static,
{
    // ---
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Load the data file and build features; no training.
async fn fresh_table(config: &Config) -> Result<FeatureTable, ApiError> {
    // ---
    let path = config.data_path.clone();
    blocking(move || pipeline::load_table(&path)).await
}

/// Load, check the floor exists, then train and report.
async fn fresh_report(config: &Config, floor: i64) -> Result<FloorReport, ApiError> {
    // ---
    let path = config.data_path.clone();
    let training = config.training;
    blocking(move || pipeline::floor_report(&path, floor, &training)).await
}
