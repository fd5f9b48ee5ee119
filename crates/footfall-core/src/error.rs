use thiserror::Error;

/// Failures surfaced by a [`crate::visits::VisitBackend`].
#[derive(Debug, Error)]
pub enum VisitError {
    /// Schema creation failed earlier in this process. The reason is cached
    /// and returned to every caller; creation is not re-attempted.
    #[error("{0}")]
    SchemaUnavailable(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
