//! Service configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `FINANCEIRO_*` environment variables (`__` separates nested keys, e.g.
//! `FINANCEIRO_SPENDING_POLICY__ESSENTIAL_PCT`). A `.env` file is loaded into
//! the environment first.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use argon2::Params;
use chrono::{Duration, FixedOffset};
use compute::SpendingPolicy;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use sea_orm::Database;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::auth::{AuthSettings, LogNotifier, SeaOrmAuth};
use crate::backend::SeaOrmStore;
use crate::schemas::AppState;

pub const DEFAULT_CONFIG_FILE: &str = "financeiro.toml";
const ENV_PREFIX: &str = "FINANCEIRO";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
struct RawPolicy {
    essential_pct: Option<f64>,
    non_essential_pct: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    database_url: Option<String>,
    anon_key: Option<String>,
    bind_address: String,
    session_ttl_secs: i64,
    session_cache_ttl_secs: u64,
    code_ttl_secs: i64,
    require_email_confirmation: bool,
    timezone_offset_minutes: i32,
    spending_policy: Option<RawPolicy>,
}

/// Validated configuration.
#[derive(Clone)]
pub struct Settings {
    pub database_url: String,
    /// Shared key every client sends in the `apikey` header
    pub anon_key: String,
    pub bind_address: String,
    pub session_ttl_secs: i64,
    pub session_cache_ttl_secs: u64,
    pub code_ttl_secs: i64,
    pub require_email_confirmation: bool,
    /// Zone used to bucket records by month
    pub timezone: FixedOffset,
    pub spending_policy: Option<SpendingPolicy>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("database_url", &"<redacted>")
            .field("anon_key", &"<redacted>")
            .field("bind_address", &self.bind_address)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_cache_ttl_secs", &self.session_cache_ttl_secs)
            .field("code_ttl_secs", &self.code_ttl_secs)
            .field("require_email_confirmation", &self.require_email_confirmation)
            .field("timezone", &self.timezone)
            .field("spending_policy", &self.spending_policy)
            .finish()
    }
}

fn required(value: Option<String>, key: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn positive(value: i64, key: &'static str) -> Result<i64, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn percentage(value: f64, key: &'static str) -> Result<Decimal, ConfigError> {
    Decimal::from_f64(value).ok_or_else(|| ConfigError::Invalid {
        key,
        reason: format!("{} is not a number", value),
    })
}

fn spending_policy(raw: Option<RawPolicy>) -> Result<Option<SpendingPolicy>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match (raw.essential_pct, raw.non_essential_pct) {
        (None, None) => Ok(None),
        (Some(essential), Some(non_essential)) => {
            let policy = SpendingPolicy::new(
                percentage(essential, "spending_policy.essential_pct")?,
                percentage(non_essential, "spending_policy.non_essential_pct")?,
            )
            .map_err(|e| ConfigError::Invalid {
                key: "spending_policy",
                reason: e.to_string(),
            })?;
            Ok(Some(policy))
        }
        _ => Err(ConfigError::Invalid {
            key: "spending_policy",
            reason: "essential_pct and non_essential_pct must be set together".to_string(),
        }),
    }
}

impl Settings {
    /// Loads settings from `path` (optional unless `file_required`) and the
    /// process environment.
    pub fn load(path: &str, file_required: bool) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(path, file_required, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_from(
        path: &str,
        file_required: bool,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        debug!(
            "Loading configuration from {} (exists: {})",
            path,
            Path::new(path).exists()
        );
        let raw: RawSettings = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("session_ttl_secs", 86_400)?
            .set_default("session_cache_ttl_secs", 300)?
            .set_default("code_ttl_secs", 3_600)?
            .set_default("require_email_confirmation", true)?
            .set_default("timezone_offset_minutes", -180)?
            .add_source(
                config::File::new(path, config::FileFormat::Toml).required(file_required),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let timezone = FixedOffset::east_opt(raw.timezone_offset_minutes.saturating_mul(60))
            .ok_or_else(|| ConfigError::Invalid {
                key: "timezone_offset_minutes",
                reason: format!("{} is out of range", raw.timezone_offset_minutes),
            })?;
        if raw.session_cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "session_cache_ttl_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url: required(raw.database_url, "database_url")?,
            anon_key: required(raw.anon_key, "anon_key")?,
            bind_address: raw.bind_address,
            session_ttl_secs: positive(raw.session_ttl_secs, "session_ttl_secs")?,
            session_cache_ttl_secs: raw.session_cache_ttl_secs,
            code_ttl_secs: positive(raw.code_ttl_secs, "code_ttl_secs")?,
            require_email_confirmation: raw.require_email_confirmation,
            timezone,
            spending_policy: spending_policy(raw.spending_policy)?,
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            session_ttl: Duration::seconds(self.session_ttl_secs),
            code_ttl: Duration::seconds(self.code_ttl_secs),
            require_email_confirmation: self.require_email_confirmation,
            password_params: Params::default(),
        }
    }
}

/// Connects to the database and wires the store and auth provider into the
/// application state.
pub async fn initialize_app_state(settings: Settings) -> Result<AppState> {
    info!("Connecting to database");
    let db = Database::connect(&settings.database_url).await?;

    let store = SeaOrmStore::new(db.clone());
    let auth = SeaOrmAuth::new(db, Arc::new(LogNotifier), settings.auth_settings());
    debug!("Application state ready: {:?}", settings);

    Ok(AppState::new(Arc::new(store), Arc::new(auth), settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        Settings::load_from("does-not-exist.toml", false, Some(env(pairs)))
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("FINANCEIRO_DATABASE_URL", "sqlite::memory:"),
        ("FINANCEIRO_ANON_KEY", "anon-key"),
    ];

    #[test]
    fn test_defaults() {
        let settings = load(&REQUIRED).unwrap();

        assert_eq!(settings.bind_address, "0.0.0.0:3000");
        assert_eq!(settings.session_ttl_secs, 86_400);
        assert_eq!(settings.session_cache_ttl_secs, 300);
        assert_eq!(settings.code_ttl_secs, 3_600);
        assert!(settings.require_email_confirmation);
        assert_eq!(settings.timezone.local_minus_utc(), -180 * 60);
        assert!(settings.spending_policy.is_none());
    }

    #[test]
    fn test_credentials_from_environment_only() {
        let settings = load(&[
            ("FINANCEIRO_DATABASE_URL", "postgres://app@db/financeiro"),
            ("FINANCEIRO_ANON_KEY", "env-anon-key"),
        ])
        .unwrap();

        assert_eq!(settings.database_url, "postgres://app@db/financeiro");
        assert_eq!(settings.anon_key, "env-anon-key");
    }

    #[test]
    fn test_missing_required_keys_fail_closed() {
        let err = load(&[("FINANCEIRO_ANON_KEY", "anon-key")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("database_url")));

        let err = load(&[
            ("FINANCEIRO_DATABASE_URL", "sqlite::memory:"),
            ("FINANCEIRO_ANON_KEY", "   "),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("anon_key")));
    }

    #[test]
    fn test_environment_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("FINANCEIRO_BIND_ADDRESS", "127.0.0.1:8080"),
            ("FINANCEIRO_REQUIRE_EMAIL_CONFIRMATION", "false"),
            ("FINANCEIRO_TIMEZONE_OFFSET_MINUTES", "60"),
            ("FINANCEIRO_SPENDING_POLICY__ESSENTIAL_PCT", "50"),
            ("FINANCEIRO_SPENDING_POLICY__NON_ESSENTIAL_PCT", "30"),
        ]);
        let settings = load(&pairs).unwrap();

        assert_eq!(settings.bind_address, "127.0.0.1:8080");
        assert!(!settings.require_email_confirmation);
        assert_eq!(settings.timezone.local_minus_utc(), 3_600);
        let policy = settings.spending_policy.unwrap();
        assert_eq!(policy.essential_pct(), Decimal::from(50));
        assert_eq!(policy.savings_pct(), Decimal::from(20));
    }

    #[test]
    fn test_half_configured_policy_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FINANCEIRO_SPENDING_POLICY__ESSENTIAL_PCT", "50"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "spending_policy", .. }));
    }

    #[test]
    fn test_policy_over_one_hundred_percent_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("FINANCEIRO_SPENDING_POLICY__ESSENTIAL_PCT", "80"),
            ("FINANCEIRO_SPENDING_POLICY__NON_ESSENTIAL_PCT", "30"),
        ]);
        assert!(load(&pairs).is_err());
    }

    #[test]
    fn test_out_of_range_timezone_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("FINANCEIRO_TIMEZONE_OFFSET_MINUTES", "1500"));
        let err = load(&pairs).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "timezone_offset_minutes", .. }
        ));
    }

    #[test]
    fn test_file_values_are_overridden_by_environment() {
        let path = std::env::temp_dir().join(format!("financeiro-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            "database_url = \"sqlite://from-file.db\"\nanon_key = \"file-key\"\nsession_ttl_secs = 600\n",
        )
        .unwrap();

        let settings = Settings::load_from(
            path.to_str().unwrap(),
            true,
            Some(env(&[("FINANCEIRO_ANON_KEY", "env-key")])),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.database_url, "sqlite://from-file.db");
        assert_eq!(settings.anon_key, "env-key");
        assert_eq!(settings.session_ttl_secs, 600);
    }

    #[test]
    fn test_required_file_must_exist() {
        let err = Settings::load_from("does-not-exist.toml", true, Some(env(&REQUIRED)))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let settings = load(&REQUIRED).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("anon-key"));
        assert!(!printed.contains("sqlite::memory:"));
    }
}
