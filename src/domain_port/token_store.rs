use crate::domain_model::PersistedSession;

/// Durable storage for sessions.
///
/// Each operation is expected to be atomic on its own. Nothing here spans two
/// calls, so `find_by_identifier` followed by `update` is not a transaction.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Insert a new session. Fails with `AlreadyExists` if the identifier is taken.
    async fn create(&self, session: PersistedSession) -> Result<(), TokenStoreError>;

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<PersistedSession, TokenStoreError>;

    /// Rewrite the expiration of an existing session. Fails with `NotFound`
    /// rather than inserting when the identifier is gone.
    async fn update(&self, session: PersistedSession) -> Result<(), TokenStoreError>;

    async fn revoke(&self, identifier: &str) -> Result<(), TokenStoreError>;

    /// All sessions for a user, in no particular order.
    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, TokenStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
    #[error("session not found")]
    NotFound,
    #[error("session identifier already exists")]
    AlreadyExists,
    #[error("infra error: {0}")]
    Store(String),
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
