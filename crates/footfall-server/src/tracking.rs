use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

use footfall_core::identity::{resolve_visitor, set_cookie_value};
use footfall_core::track::should_track;

use crate::state::AppState;

/// Middleware counting page views.
///
/// For requests accepted by [`should_track`], resolves the `vid` cookie
/// (minting one if needed), queues the visit, and lets the request continue.
/// Storage problems never reach the visitor: the visit is only buffered here.
pub async fn track_visit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.visits_enabled() || !should_track(request.method().as_str(), request.uri().path()) {
        return next.run(request).await;
    }

    // Copy what we need out of the request before any await.
    let path = request.uri().path().to_string();
    let cookie_header = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        // Other apps on the domain may set raw UTF-8 cookies; keep the rest.
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .collect::<Vec<_>>()
        .join("; ");
    let identity = resolve_visitor(Some(cookie_header.as_str()).filter(|h| !h.is_empty()));

    state.record_visit(identity.visitor_id.clone(), &path).await;

    let mut response = next.run(request).await;

    if identity.is_new {
        match HeaderValue::from_str(&set_cookie_value(&identity.visitor_id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Could not encode visitor cookie"),
        }
    }

    response
}
