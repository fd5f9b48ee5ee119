use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use footfall_core::visits::{clamp_series_days, parse_series_days, VisitBackend};

use crate::{error::AppError, state::AppState};

/// `GET /admin/api/visits` — page views and unique visitors per window.
///
/// ```json
/// { "ok": true, "stats": { "today": {"pageViews": 5, "uniqueVisitors": 2},
///                          "d7": {..}, "d30": {..}, "all": {..} } }
/// ```
#[tracing::instrument(skip(state))]
pub async fn summary(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let visits = state.visits.as_ref().ok_or(AppError::NotConfigured)?;
    let stats = visits.window_stats(Utc::now()).await?;
    Ok(Json(json!({ "ok": true, "stats": stats })))
}

/// `GET /admin/api/visits/timeseries?days=N` — one point per UTC day.
///
/// `days` defaults to 30. The response echoes the requested value, while the
/// series itself is clamped to `1..=365` points. A repeated `days` parameter
/// uses the first occurrence.
#[tracing::instrument(skip(state))]
pub async fn timeseries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<impl IntoResponse, AppError> {
    let visits = state.visits.as_ref().ok_or(AppError::NotConfigured)?;
    let raw_days = params
        .iter()
        .find(|(key, _)| key == "days")
        .map(|(_, value)| value.as_str());
    let requested = parse_series_days(raw_days);
    let series = visits
        .daily_series(Utc::now(), clamp_series_days(requested))
        .await?;
    Ok(Json(json!({ "ok": true, "days": requested, "series": series })))
}
