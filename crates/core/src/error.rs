use crate::types::DbId;

/// Domain-level errors shared by every layer of the client.
///
/// These are raised locally, before any network call; the remote
/// store's own rejections travel separately as store errors in the
/// client crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}
