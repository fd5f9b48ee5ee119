pub mod dashboard;
pub mod health;
pub mod visits;

use axum::{http::StatusCode, response::IntoResponse};

/// Fallback for paths no route claims. Static site serving is left to
/// whatever fronts this server.
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not found")
}
