use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable half of a session, as handed to and returned by a `TokenStore`.
///
/// Only the hash of the verifier is kept; the verifier itself leaves the
/// process once, inside the token returned by `generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub identifier: String,
    pub verifier_hash: String,
    pub expiration_date_time: DateTime<Utc>,
    pub user_id: String,
    pub details: String,
}

impl PersistedSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date_time < now
    }

    /// Same record with a new expiration; every other field is preserved.
    pub fn renewed(&self, expiration_date_time: DateTime<Utc>) -> Self {
        PersistedSession {
            expiration_date_time,
            ..self.clone()
        }
    }
}
