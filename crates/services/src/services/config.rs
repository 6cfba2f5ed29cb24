//! Process configuration read from the environment (optionally via `.env`).

use std::{str::FromStr, time::Duration};

use secrecy::SecretString;
use strum_macros::{Display, EnumString};
use thiserror::Error;
use tracing::warn;

const DEV_AUTH_SECRET: &str = "vet-clinic-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub auth_secret: SecretString,
    pub session_ttl: Duration,
    pub admin_username: Option<String>,
    pub admin_password: Option<SecretString>,
    pub require_auth: bool,
    pub list_cache_ttl: Duration,
    pub cache_stats_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = parse_or(&get, "APP_ENV", Environment::Development)?;

        let auth_secret = match get("AUTH_SECRET") {
            Some(secret) => SecretString::from(secret),
            None if environment == Environment::Production => {
                return Err(ConfigError::Missing("AUTH_SECRET"));
            }
            None => {
                warn!("AUTH_SECRET not set, using the development secret");
                SecretString::from(DEV_AUTH_SECRET.to_string())
            }
        };

        Ok(Self {
            database_url: get("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://vet_clinic.db?mode=rwc".to_string()),
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 3001)?,
            environment,
            auth_secret,
            session_ttl: Duration::from_secs(parse_or(&get, "SESSION_TTL_HOURS", 24u64)? * 3600),
            admin_username: get("ADMIN_USERNAME"),
            admin_password: get("ADMIN_PASSWORD").map(SecretString::from),
            require_auth: parse_or(&get, "REQUIRE_AUTH", false)?,
            list_cache_ttl: Duration::from_secs(parse_or(&get, "LIST_CACHE_TTL_SECS", 30u64)?),
            cache_stats_interval: Duration::from_secs(parse_or(
                &get,
                "CACHE_STATS_INTERVAL_SECS",
                30u64,
            )?),
        })
    }

    /// In-memory database, development environment, no seeded users.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: Environment::Development,
            auth_secret: SecretString::from(DEV_AUTH_SECRET.to_string()),
            session_ttl: Duration::from_secs(24 * 3600),
            admin_username: None,
            admin_password: None,
            require_auth: false,
            list_cache_ttl: Duration::from_secs(30),
            cache_stats_interval: Duration::from_secs(30),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
