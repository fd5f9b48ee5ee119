use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

use super::basic::{check_basic_auth, OperatorCheck};

const CHALLENGE: &str = r#"Basic realm="Admin""#;

/// Gate for every `/admin` route: HTTP Basic auth against
/// `FOOTFALL_ADMIN_TOKEN`.
///
/// Responses are plain text so a browser shows them directly; 401s carry a
/// `WWW-Authenticate` challenge so the browser prompts for credentials.
pub async fn require_operator(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    // Evaluate synchronously so no borrow of the request is held across await.
    let check = check_basic_auth(
        state.config.admin_token.as_deref(),
        request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok()),
    );

    match check {
        OperatorCheck::Granted => next.run(request).await,
        OperatorCheck::NotConfigured => {
            tracing::warn!("Admin route requested but FOOTFALL_ADMIN_TOKEN is not set");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                "FOOTFALL_ADMIN_TOKEN is not set. Set it in the server environment before using /admin.",
            )
                .into_response()
        }
        OperatorCheck::MissingCredentials => challenge("Auth required"),
        OperatorCheck::WrongPassword => {
            tracing::info!("Admin auth rejected: invalid password");
            challenge("Invalid password")
        }
    }
}

fn challenge(message: &'static str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [
            (header::WWW_AUTHENTICATE, HeaderValue::from_static(CHALLENGE)),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
        ],
        message,
    )
        .into_response()
}
