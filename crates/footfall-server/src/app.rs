use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::{auth, routes, state::AppState, tracking};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware, outermost first:
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `track_visit` — counts page views on every route, including the
///    fallback; admin and health paths are filtered out by the track rules.
/// 3. `require_operator` — Basic auth, on the `/admin` routes only.
pub fn build_app(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/admin/api/visits", get(routes::visits::summary))
        .route(
            "/admin/api/visits/timeseries",
            get(routes::visits::timeseries),
        )
        .route("/admin/visits", get(routes::dashboard::dashboard))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::middleware::require_operator,
        ));

    Router::new()
        .route("/healthz", get(routes::health::health))
        .merge(admin)
        .fallback(routes::not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            tracking::track_visit,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
