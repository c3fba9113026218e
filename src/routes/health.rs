// src/routes/health.rs
//! Liveness endpoint for the EcoFloor service.
//!
//! Exports to the gateway (`mod.rs`) a subrouter containing the `/health`
//! route. The handler never touches the data file, so it answers even when
//! the pipeline cannot run.

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Create a subrouter containing the `/health` route.
///
/// Generic over the application state so it merges with the gateway router
/// whatever state type that router carries.
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health))
}
