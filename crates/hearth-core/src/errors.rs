use thiserror::Error;

use crate::session::SessionError;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A collection was requested with a shape never declared at startup.
    /// Fatal to the request, not to the process.
    #[error("invalid collection identity: {shape}")]
    InvalidIdentity { shape: String },

    /// An external deadline expired while waiting on a resource.
    #[error("resource unavailable: {context}")]
    ResourceUnavailable { context: String },

    /// A session-level call failed. Carries the typed cause and is
    /// propagated to the caller of that one operation, never aggregated
    /// across unrelated accounts.
    #[error("session operation failed for {context}: {source}")]
    SessionOperationFailed {
        context: String,
        #[source]
        source: SessionError,
    },

    /// A derived view observed a mutation it could not reconcile. Debug
    /// builds assert; release builds log and continue.
    #[error("consistency violation: {detail}")]
    ConsistencyViolation { detail: String },

    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl CoreError {
    pub fn session(context: impl Into<String>, source: SessionError) -> Self {
        CoreError::SessionOperationFailed {
            context: context.into(),
            source,
        }
    }
}
