use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};

use footfall_core::visits::{VisitBackend, VisitStats, WindowStats};

use crate::state::AppState;

const TEMPLATE: &str = include_str!("dashboard.html");

/// `GET /admin/visits` — HTML dashboard: window table plus a client-side
/// chart of the last 30 days.
#[tracing::instrument(skip(state))]
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let Some(visits) = state.visits.as_ref() else {
        return plain(StatusCode::BAD_REQUEST, "visit storage not configured\n".to_string());
    };

    let now = Utc::now();
    match visits.window_stats(now).await {
        Ok(stats) => Html(render(&stats, now)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dashboard stats failed");
            plain(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn plain(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

pub fn render(stats: &VisitStats, generated_at: DateTime<Utc>) -> String {
    let rows = [
        ("Today", stats.today),
        ("Last 7 days", stats.d7),
        ("Last 30 days", stats.d30),
        ("All time", stats.all),
    ]
    .iter()
    .map(|(label, window)| row(label, window))
    .collect::<Vec<_>>()
    .join("\n");

    TEMPLATE
        .replace(
            "{{generated_at}}",
            &generated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .replace("{{rows}}", &rows)
}

fn row(label: &str, window: &WindowStats) -> String {
    format!(
        "        <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
        label, window.page_views, window.unique_visitors
    )
}
