use crate::domain_model::PersistedSession;
use crate::domain_port::*;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Process-local `TokenStore`. Sessions are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    sessions: RwLock<HashMap<String, PersistedSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn create(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.identifier) {
            return Err(TokenStoreError::AlreadyExists);
        }
        debug!(identifier = %session.identifier, user_id = %session.user_id, "storing session");
        sessions.insert(session.identifier.clone(), session);
        Ok(())
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<PersistedSession, TokenStoreError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(identifier)
            .cloned()
            .ok_or(TokenStoreError::NotFound)
    }

    async fn update(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        let mut sessions = self.sessions.write().await;
        let stored = sessions
            .get_mut(&session.identifier)
            .ok_or(TokenStoreError::NotFound)?;
        stored.expiration_date_time = session.expiration_date_time;
        Ok(())
    }

    async fn revoke(&self, identifier: &str) -> Result<(), TokenStoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(identifier);
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, TokenStoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn session(identifier: &str, user_id: &str) -> PersistedSession {
        PersistedSession {
            identifier: identifier.to_string(),
            verifier_hash: "00".repeat(32),
            expiration_date_time: Utc::now() + TimeDelta::days(1),
            user_id: user_id.to_string(),
            details: "{\"device\":\"cli\"}".to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_duplicate_identifier() {
        let store = MemoryTokenStore::new();
        store.create(session("a", "user-1")).await.unwrap();

        let err = store.create(session("a", "user-2")).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::AlreadyExists));
        assert_eq!(store.find_by_identifier("a").await.unwrap().user_id, "user-1");
    }

    #[tokio::test]
    async fn find_unknown_is_not_found() {
        let store = MemoryTokenStore::new();
        let err = store.find_by_identifier("missing").await.unwrap_err();
        assert!(matches!(err, TokenStoreError::NotFound));
    }

    #[tokio::test]
    async fn update_only_touches_expiration() {
        let store = MemoryTokenStore::new();
        let original = session("a", "user-1");
        store.create(original.clone()).await.unwrap();

        let later = original.expiration_date_time + TimeDelta::days(3);
        let mut changed = original.renewed(later);
        changed.details = "tampered".to_string();
        store.update(changed).await.unwrap();

        let stored = store.find_by_identifier("a").await.unwrap();
        assert_eq!(stored.expiration_date_time, later);
        assert_eq!(stored.details, original.details);
    }

    #[tokio::test]
    async fn update_after_revoke_does_not_resurrect() {
        let store = MemoryTokenStore::new();
        let original = session("a", "user-1");
        store.create(original.clone()).await.unwrap();
        store.revoke("a").await.unwrap();

        let err = store.update(original).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::NotFound));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn revoke_unknown_is_noop() {
        let store = MemoryTokenStore::new();
        store.create(session("a", "user-1")).await.unwrap();
        store.revoke("b").await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn list_filters_by_user() {
        let store = MemoryTokenStore::new();
        for id in ["a", "b", "c"] {
            store.create(session(id, "user-1")).await.unwrap();
        }
        store.create(session("d", "user-2")).await.unwrap();

        let sessions = store.list("user-1").await.unwrap();
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| s.user_id == "user-1"));
        assert!(store.list("nobody").await.unwrap().is_empty());
    }
}
