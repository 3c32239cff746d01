use crate::domain_model::{MalformedToken, PersistedSession};
use crate::domain_port::{RandomSourceError, TokenStoreError};

/// Failures of the session manager.
///
/// Expired sessions and wrong verifiers are not errors; `verify` reports them
/// as `Ok(false)`. Anything here means the outcome could not be decided or
/// recorded.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("random source error: {0}")]
    RandomSource(String),
    #[error("malformed token: {0}")]
    MalformedToken(#[from] MalformedToken),
    #[error("session not found")]
    NotFound,
    #[error("session identifier already exists")]
    AlreadyExists,
    #[error("corrupt session record: {0}")]
    CorruptRecord(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<TokenStoreError> for SessionError {
    fn from(err: TokenStoreError) -> Self {
        match err {
            TokenStoreError::NotFound => SessionError::NotFound,
            TokenStoreError::AlreadyExists => SessionError::AlreadyExists,
            TokenStoreError::Store(e) => SessionError::Store(e),
            TokenStoreError::InternalError(e) => SessionError::InternalError(e),
        }
    }
}

impl From<RandomSourceError> for SessionError {
    fn from(err: RandomSourceError) -> Self {
        SessionError::RandomSource(err.0)
    }
}

#[async_trait::async_trait]
pub trait SessionManager: Send + Sync {
    /// Issue a new token for `user_id` and persist its session.
    async fn generate(&self, user_id: &str, details: &str) -> Result<String, SessionError>;
    /// `Ok(true)` for a live session with a matching verifier, renewing it at
    /// most once per day.
    async fn verify(&self, token: &str) -> Result<bool, SessionError>;
    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, SessionError>;
    async fn revoke(&self, identifier: &str) -> Result<(), SessionError>;
}
