use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use footfall_core::error::VisitError;

/// Errors returned by the admin JSON endpoints.
///
/// Bodies follow the `{ "ok": false, "error": "..." }` envelope used by every
/// admin API response.
#[derive(Debug, Error)]
pub enum AppError {
    /// No `FOOTFALL_DATABASE_URL`; visit tracking is switched off.
    #[error("visit storage not configured")]
    NotConfigured,

    #[error(transparent)]
    Visits(#[from] VisitError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotConfigured => StatusCode::BAD_REQUEST,
            AppError::Visits(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Visits(e) = &self {
            tracing::error!(error = %e, "Visit aggregate query failed");
        }
        (
            status,
            Json(json!({
                "ok": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_configured_is_a_client_error() {
        assert_eq!(AppError::NotConfigured.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn schema_failure_keeps_its_reason() {
        let err = AppError::from(VisitError::SchemaUnavailable("disk full".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "disk full");
    }
}
