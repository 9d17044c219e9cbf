use thiserror::Error;

/// Error taxonomy surfaced by the core (`spec.md` §7). `Transient` never escapes
/// `aegis-provisioner` — it is absorbed by the retry wrapper before reaching a caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("session not found")]
    NotFound,

    #[error("idempotency key reused with a different request body")]
    IdempotencyMismatch,

    #[error("relay health event rejected: no bound relay instance")]
    RelayHealthRejected,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("transient provisioner error: {0}")]
    Transient(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound => "not_found",
            CoreError::IdempotencyMismatch => "idempotency_mismatch",
            CoreError::RelayHealthRejected => "invalid_request",
            CoreError::Internal(_) => "internal_error",
            CoreError::Transient(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => CoreError::NotFound,
            other => {
                tracing::error!(cause = %other, "database operation failed");
                CoreError::Internal(other.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(error: serde_json::Error) -> Self {
        CoreError::Internal(format!("serialization failed: {error}"))
    }
}
