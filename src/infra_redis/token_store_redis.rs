use crate::domain_model::PersistedSession;
use crate::domain_port::*;
use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use std::collections::HashMap;

const SESSION_CREATE: &str = include_str!("session_create.lua");
const SESSION_UPDATE: &str = include_str!("session_update.lua");
const SESSION_REVOKE: &str = include_str!("session_revoke.lua");

/// `TokenStore` keeping one hash per session plus a set of identifiers per
/// user. Keys carry no TTL; expired sessions stay until revoked.
pub struct RedisTokenStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisTokenStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn session_key(&self, identifier: &str) -> String {
        format!("{}:session:{}", self.prefix, identifier)
    }

    fn user_prefix(&self) -> String {
        format!("{}:user:", self.prefix)
    }

    fn user_key(&self, user_id: &str) -> String {
        format!("{}{}", self.user_prefix(), user_id)
    }
}

fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn session_from_fields(
    mut fields: HashMap<String, String>,
) -> Result<Option<PersistedSession>, TokenStoreError> {
    if fields.is_empty() {
        return Ok(None);
    }

    let mut take = |name: &str| {
        fields.remove(name).ok_or_else(|| {
            TokenStoreError::InternalError(anyhow!("session hash missing field {name}"))
        })
    };
    let identifier = take("identifier")?;
    let verifier_hash = take("verifier_hash")?;
    let expiration = take("expiration_date_time")?;
    let user_id = take("user_id")?;
    let details = take("details")?;

    let expiration_date_time = DateTime::parse_from_rfc3339(&expiration)
        .map_err(|e| {
            TokenStoreError::InternalError(anyhow!("bad expiration_date_time: {e}"))
        })?
        .with_timezone(&Utc);

    Ok(Some(PersistedSession {
        identifier,
        verifier_hash,
        expiration_date_time,
        user_id,
        details,
    }))
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn create(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        let mut conn = self.conn.clone();
        let script = Script::new(SESSION_CREATE);
        let created: i64 = script
            .key(self.session_key(&session.identifier))
            .key(self.user_key(&session.user_id))
            .arg(&session.identifier)
            .arg(&session.verifier_hash)
            .arg(encode_time(session.expiration_date_time))
            .arg(&session.user_id)
            .arg(&session.details)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        match created {
            1 => Ok(()),
            _ => Err(TokenStoreError::AlreadyExists),
        }
    }

    async fn find_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<PersistedSession, TokenStoreError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(self.session_key(identifier))
            .await
            .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        session_from_fields(fields)?.ok_or(TokenStoreError::NotFound)
    }

    async fn update(&self, session: PersistedSession) -> Result<(), TokenStoreError> {
        let mut conn = self.conn.clone();
        let script = Script::new(SESSION_UPDATE);
        let updated: i64 = script
            .key(self.session_key(&session.identifier))
            .arg(encode_time(session.expiration_date_time))
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        match updated {
            1 => Ok(()),
            _ => Err(TokenStoreError::NotFound),
        }
    }

    async fn revoke(&self, identifier: &str) -> Result<(), TokenStoreError> {
        let mut conn = self.conn.clone();
        let script = Script::new(SESSION_REVOKE);
        let _: i64 = script
            .key(self.session_key(identifier))
            .arg(self.user_prefix())
            .arg(identifier)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| TokenStoreError::Store(e.to_string()))?;
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<PersistedSession>, TokenStoreError> {
        let mut conn = self.conn.clone();
        let identifiers: Vec<String> = conn
            .smembers(self.user_key(user_id))
            .await
            .map_err(|e| TokenStoreError::Store(e.to_string()))?;

        let mut sessions = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let fields: HashMap<String, String> = conn
                .hgetall(self.session_key(&identifier))
                .await
                .map_err(|e| TokenStoreError::Store(e.to_string()))?;
            // revoked between SMEMBERS and HGETALL
            if let Some(session) = session_from_fields(fields)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }
}
