use crate::domain_model::ExpirationPolicy;
use anyhow::{Result, anyhow};
use chrono::TimeDelta;
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: Log,
    #[serde(default)]
    pub session: Session,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

/// Omitted fields fall back to 30 x 24h.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Session {
    pub expiration_amount: i64,
    pub expiration_unit_secs: i64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            expiration_amount: 30,
            expiration_unit_secs: 86400,
        }
    }
}

impl Session {
    pub fn expiration_policy(&self) -> Result<ExpirationPolicy> {
        let unit = TimeDelta::try_seconds(self.expiration_unit_secs)
            .ok_or_else(|| anyhow!("expiration_unit_secs out of range"))?;
        Ok(ExpirationPolicy::new(self.expiration_amount, unit)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mysql,
    Redis,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: StoreBackend,
    pub mysql_url: Option<String>,
    pub redis_url: Option<String>,
    #[serde(default = "default_redis_prefix")]
    pub redis_prefix: String,
}

fn default_redis_prefix() -> String {
    "tokensession".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn loads_dev_settings() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(
            settings.session.expiration_policy().unwrap(),
            ExpirationPolicy::default()
        );
    }

    #[test]
    fn missing_file_is_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }

    #[test]
    fn reads_backend_and_policy() {
        let settings = from_toml(
            r#"
[log]
filter = "debug"

[session]
expiration_amount = -30
expiration_unit_secs = 86400

[store]
backend = "redis"
redis_url = "redis://127.0.0.1/"
"#,
        );

        assert_eq!(settings.store.backend, StoreBackend::Redis);
        assert_eq!(settings.store.redis_prefix, "tokensession");
        assert!(settings.store.mysql_url.is_none());
        assert_eq!(
            settings.session.expiration_policy().unwrap().delta(),
            TimeDelta::days(-30)
        );
    }

    #[test]
    fn missing_session_section_uses_thirty_days() {
        let settings = from_toml(
            r#"
[log]
filter = "info"

[store]
backend = "memory"
"#,
        );

        assert_eq!(
            settings.session.expiration_policy().unwrap(),
            ExpirationPolicy::default()
        );
    }

    #[test]
    fn partial_session_section_keeps_default_unit() {
        let settings = from_toml(
            r#"
[log]
filter = "info"

[session]
expiration_amount = 7

[store]
backend = "memory"
"#,
        );

        assert_eq!(
            settings.session.expiration_policy().unwrap().delta(),
            TimeDelta::days(7)
        );
    }

    #[test]
    fn overflowing_policy_is_rejected() {
        let session = Session {
            expiration_amount: i64::MAX,
            expiration_unit_secs: 86400,
        };
        assert!(session.expiration_policy().is_err());
    }
}
