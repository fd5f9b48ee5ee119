use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use footfall_core::visits::VisitBackend;

use crate::state::AppState;

/// `GET /healthz` — liveness plus the state of visit tracking.
///
/// Always `200 OK`; a broken visit store degrades tracking, not the server.
///
/// Response shape:
/// ```json
/// {
///   "ok": true,
///   "version": "0.1.0",
///   "visits": {
///     "enabled": true, "ready": true, "initError": null,
///     "recorded": 12, "failed": 0, "dropped": 0
///   }
/// }
/// ```
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let schema = state
        .visits
        .as_ref()
        .map(|visits| visits.schema_status())
        .unwrap_or_default();
    let counters = state.recorder.counters();

    Json(json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "visits": {
            "enabled": state.visits_enabled(),
            "ready": schema.ready,
            "initError": schema.init_error,
            "recorded": counters.recorded,
            "failed": counters.failed,
            "dropped": counters.dropped,
        }
    }))
}
