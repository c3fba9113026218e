//! Per-floor endpoints: floor list, recent rows, forecast and alert table.
//!
//! Every request rereads the current data file. Only the forecast and alert
//! endpoints train models.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{fresh_report, fresh_table, ApiError};
use crate::alerts::filter_by_level;
use crate::models::{Alert, FeatureRow, Level};
use crate::{Config, FloorReport};

// ---

const DEFAULT_RECENT_LIMIT: usize = 10;

pub fn router() -> Router<Config> {
    // ---
    Router::new()
        .route("/floors", get(list_floors))
        .route("/floors/{piso}/readings", get(recent_readings))
        .route("/floors/{piso}/forecast", get(forecast))
        .route("/floors/{piso}/alerts", get(alerts))
}

#[derive(Debug, Serialize)]
struct FloorsResponse {
    floors: Vec<i64>,
}

async fn list_floors(State(config): State<Config>) -> Result<Json<FloorsResponse>, ApiError> {
    // ---
    info!("GET /floors");
    let table = fresh_table(&config).await?;
    Ok(Json(FloorsResponse {
        floors: table.floors(),
    }))
}

/// Query parameters for the recent-rows endpoint
#[derive(Debug, Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn recent_readings(
    Path(piso): Path<i64>,
    Query(params): Query<RecentQuery>,
    State(config): State<Config>,
) -> Result<Json<Vec<FeatureRow>>, ApiError> {
    // ---
    info!("GET /floors/{}/readings", piso);
    let table = fresh_table(&config).await?;
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let rows = table.recent(piso, limit)?.to_vec();
    debug!("Returning {} rows for floor {}", rows.len(), piso);
    Ok(Json(rows))
}

async fn forecast(
    Path(piso): Path<i64>,
    State(config): State<Config>,
) -> Result<Json<FloorReport>, ApiError> {
    // ---
    info!("GET /floors/{}/forecast", piso);
    Ok(Json(fresh_report(&config, piso).await?))
}

/// Query parameters for filtering the alert table
#[derive(Debug, Deserialize)]
struct AlertsQuery {
    /// Level name, e.g. `Crítica` or `Media`.
    nivel: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlertsResponse {
    piso: i64,
    nivel: Option<Level>,
    urgent_alerts: usize,
    alerts: Vec<Alert>,
}

async fn alerts(
    Path(piso): Path<i64>,
    Query(params): Query<AlertsQuery>,
    State(config): State<Config>,
) -> Result<Json<AlertsResponse>, ApiError> {
    // ---
    info!("GET /floors/{}/alerts - filter {:?}", piso, params.nivel);

    let nivel = params
        .nivel
        .as_deref()
        .map(|s| Level::parse(s).ok_or_else(|| ApiError::BadRequest(format!("unknown nivel '{s}'"))))
        .transpose()?;

    let report = fresh_report(&config, piso).await?;

    // Urgency is counted on the filtered table.
    let alerts = filter_by_level(report.alerts, nivel);
    let urgent_alerts = alerts.iter().filter(|a| a.is_urgent()).count();
    Ok(Json(AlertsResponse {
        piso,
        nivel,
        urgent_alerts,
        alerts,
    }))
}
