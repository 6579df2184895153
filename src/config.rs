//! # Configuration
//!
//! [`ServiceConfig`] collects every tunable of the system. Defaults describe a
//! self-contained in-memory setup; [`ServiceConfig::from_env`] overrides them
//! from the environment (and an optional `.env` file).
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `sqlite::memory:` |
//! | `DB_MAX_CONNECTIONS` | `5` |
//! | `LOCK_TTL_SECS` | `5` |
//! | `IDEMPOTENCY_IN_PROGRESS_TTL_SECS` | `300` |
//! | `IDEMPOTENCY_COMPLETED_TTL_SECS` | `86400` |
//! | `STORE_BUFFER` | `256` |

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub lock_ttl: Duration,
    pub in_progress_ttl: Duration,
    pub completed_ttl: Duration,
    pub store_buffer: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 5,
            lock_ttl: Duration::from_secs(5),
            in_progress_ttl: Duration::from_secs(5 * 60),
            completed_ttl: Duration::from_secs(24 * 60 * 60),
            store_buffer: 256,
        }
    }
}

impl ServiceConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections),
            lock_ttl: secs(&lookup, "LOCK_TTL_SECS")?.unwrap_or(defaults.lock_ttl),
            in_progress_ttl: secs(&lookup, "IDEMPOTENCY_IN_PROGRESS_TTL_SECS")?
                .unwrap_or(defaults.in_progress_ttl),
            completed_ttl: secs(&lookup, "IDEMPOTENCY_COMPLETED_TTL_SECS")?
                .unwrap_or(defaults.completed_ttl),
            store_buffer: parse(&lookup, "STORE_BUFFER")?.unwrap_or(defaults.store_buffer),
        })
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(Some(parsed)),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

fn secs<F>(lookup: &F, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse::<u64, F>(lookup, key)?.map(Duration::from_secs))
}
