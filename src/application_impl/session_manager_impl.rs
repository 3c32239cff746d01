use super::primitives::{OsRandomSource, SystemClock, constant_time_eq, hash_verifier};
use crate::application_port::{SessionError, SessionManager};
use crate::domain_model::{ExpirationPolicy, PersistedSession, SessionToken, TOKEN_PART_BYTES};
use crate::domain_port::{Clock, RandomSource, TokenStore};
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Issues and checks opaque session tokens against a `TokenStore`.
///
/// Holds no mutable state, so one instance can serve any number of
/// concurrent callers provided the store can.
///
/// `verify` reads the session and then, when a renewal is due, writes it back
/// in a second store call. Two verifications racing on the same token both
/// write the same expiration. A `revoke` landing between the read and the
/// write is only safe if the store's `update` refuses unknown identifiers
/// (all stores in this crate do, and `verify` then fails with `NotFound`);
/// a store that upserts would bring the revoked session back.
pub struct RealSessionManager {
    store: Arc<dyn TokenStore>,
    random: Arc<dyn RandomSource>,
    clock: Arc<dyn Clock>,
    policy: ExpirationPolicy,
}

impl RealSessionManager {
    pub fn new(store: Arc<dyn TokenStore>, policy: ExpirationPolicy) -> Self {
        Self {
            store,
            random: Arc::new(OsRandomSource),
            clock: Arc::new(SystemClock),
            policy,
        }
    }

    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn random_part(&self) -> Result<[u8; TOKEN_PART_BYTES], SessionError> {
        let mut buf = [0u8; TOKEN_PART_BYTES];
        self.random.fill(&mut buf)?;
        Ok(buf)
    }

    fn expiration_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SessionError> {
        now.checked_add_signed(self.policy.delta()).ok_or_else(|| {
            SessionError::InternalError(anyhow!(
                "expiration out of range: {} + {}",
                now,
                self.policy.delta()
            ))
        })
    }

    /// A session is renewed when the day it was last issued or renewed on
    /// (expiration minus the policy delta) is not today, in UTC.
    fn renewal_due(&self, session: &PersistedSession, now: DateTime<Utc>) -> bool {
        match session
            .expiration_date_time
            .checked_sub_signed(self.policy.delta())
        {
            Some(issued) => issued.date_naive() != now.date_naive(),
            None => true,
        }
    }
}

#[async_trait::async_trait]
impl SessionManager for RealSessionManager {
    async fn generate(&self, user_id: &str, details: &str) -> Result<String, SessionError> {
        let identifier = self.random_part()?;
        let verifier = self.random_part()?;
        let token = SessionToken::from_parts(identifier, verifier);

        let session = PersistedSession {
            identifier: token.identifier().to_string(),
            verifier_hash: hex::encode(hash_verifier(token.verifier())),
            expiration_date_time: self.expiration_from(self.clock.now())?,
            user_id: user_id.to_string(),
            details: details.to_string(),
        };

        let identifier = session.identifier.clone();
        let expires_at = session.expiration_date_time;
        if let Err(e) = self.store.create(session).await {
            warn!(%identifier, error = %e, "failed to persist new session");
            return Err(e.into());
        }

        info!(%identifier, user_id, %expires_at, "session generated");
        Ok(token.to_string())
    }

    async fn verify(&self, token: &str) -> Result<bool, SessionError> {
        let token: SessionToken = token.parse()?;
        let session = self.store.find_by_identifier(token.identifier()).await?;

        let now = self.clock.now();
        if session.is_expired_at(now) {
            debug!(identifier = %session.identifier, "session expired");
            return Ok(false);
        }

        let renew = self.renewal_due(&session, now);

        let stored_hash = hex::decode(&session.verifier_hash)
            .map_err(|e| SessionError::CorruptRecord(format!("{}: {}", session.identifier, e)))?;
        if !constant_time_eq(&stored_hash, &hash_verifier(token.verifier())) {
            debug!(identifier = %session.identifier, "verifier mismatch");
            return Ok(false);
        }

        if renew {
            let renewed = session.renewed(self.expiration_from(now)?);
            let expires_at = renewed.expiration_date_time;
            if let Err(e) = self.store.update(renewed).await {
                warn!(identifier = %session.identifier, error = %e, "failed to renew session");
                return Err(e.into());
            }
            debug!(identifier = %session.identifier, %expires_at, "session renewed");
        }

        Ok(true)
    }

    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, SessionError> {
        let sessions = self.store.list(user_id).await?;
        debug!(user_id, count = sessions.len(), "sessions listed");
        Ok(sessions)
    }

    async fn revoke(&self, identifier: &str) -> Result<(), SessionError> {
        self.store.revoke(identifier).await?;
        info!(identifier, "session revoked");
        Ok(())
    }
}
