//! Server configuration
//!
//! Everything is read from environment variables. `CACHE_TTL` is required and
//! uses Go-style duration syntax (`300ms`, `30s`, `5m`, `1h30m`).

use crate::extractors::auth::AccessTokens;
use anyhow::{Context, Result};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_PORT: u16 = 5432;
const DEFAULT_CACHE_PORT: u16 = 6379;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub database: PgConnectOptions,
    pub database_max_connections: u32,
    /// `None` selects the in-process cache
    pub cache: Option<ConnectionInfo>,
    pub cache_ttl: Duration,
    pub tokens: AccessTokens,
}

/// Raw variables as they appear in the environment (keys lowercased)
#[derive(Debug, Default, Deserialize)]
struct EnvSettings {
    bind_address: Option<String>,
    database_url: Option<String>,
    database_max_connections: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_host: Option<String>,
    db_port: Option<String>,
    db_name: Option<String>,
    cache_host: Option<String>,
    cache_port: Option<String>,
    cache_password: Option<String>,
    cache_ttl: Option<String>,
    user_token: Option<String>,
    admin_token: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        info!("Loading configuration from environment...");
        let source = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("Failed to read environment")?;
        Self::from_config(source)
    }

    pub fn from_config(source: config::Config) -> Result<Self> {
        let env: EnvSettings = source
            .try_deserialize()
            .context("Failed to parse configuration")?;

        let raw_ttl = non_empty(env.cache_ttl).context("CACHE_TTL is required")?;
        let cache_ttl = parse_duration(&raw_ttl)
            .with_context(|| format!("Invalid CACHE_TTL: {:?}", raw_ttl))?;
        if cache_ttl.is_zero() {
            anyhow::bail!("CACHE_TTL must be positive");
        }

        let database_max_connections = match non_empty(env.database_max_connections) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid DATABASE_MAX_CONNECTIONS: {:?}", raw))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        // Credentials are passed as fields, never spliced into a URL
        let database = match non_empty(env.database_url) {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .context("Invalid DATABASE_URL")?,
            None => {
                let mut options = PgConnectOptions::new()
                    .host(&non_empty(env.db_host).unwrap_or_else(|| "localhost".to_string()))
                    .port(parse_port(env.db_port, DEFAULT_DB_PORT, "DB_PORT")?)
                    .ssl_mode(PgSslMode::Disable);
                if let Some(user) = non_empty(env.db_user) {
                    options = options.username(&user);
                }
                if let Some(password) = non_empty(env.db_password) {
                    options = options.password(&password);
                }
                if let Some(name) = non_empty(env.db_name) {
                    options = options.database(&name);
                }
                options
            }
        };

        let cache = match non_empty(env.cache_host) {
            Some(host) => Some(ConnectionInfo {
                addr: ConnectionAddr::Tcp(
                    host,
                    parse_port(env.cache_port, DEFAULT_CACHE_PORT, "CACHE_PORT")?,
                ),
                redis: RedisConnectionInfo {
                    db: 0,
                    password: non_empty(env.cache_password),
                    ..Default::default()
                },
            }),
            None => None,
        };

        let defaults = AccessTokens::default();
        let tokens = AccessTokens {
            user_token: non_empty(env.user_token).unwrap_or(defaults.user_token),
            admin_token: non_empty(env.admin_token).unwrap_or_else(|| {
                warn!("ADMIN_TOKEN not set, using default (insecure for production)");
                defaults.admin_token
            }),
        };

        Ok(Self {
            bind_address: non_empty(env.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database,
            database_max_connections,
            cache,
            cache_ttl,
            tokens,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_port(raw: Option<String>, default: u16, name: &str) -> Result<u16> {
    match non_empty(raw) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("empty duration")]
    Empty,
    #[error("negative durations are not allowed")]
    Negative,
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("missing unit after {0:?}")]
    MissingUnit(String),
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
}

/// Parse a Go-style duration such as `1h30m` or `250ms`.
///
/// A bare `0` is accepted without a unit.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, DurationError> {
    let trimmed = input.trim();
    let s = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if s.starts_with('-') {
        return Err(DurationError::Negative);
    }
    if s.is_empty() {
        return Err(DurationError::Empty);
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut nanos = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_end);
        if number.is_empty() || number == "." {
            return Err(DurationError::InvalidNumber(number.to_string()));
        }
        let value: f64 = number
            .parse()
            .map_err(|_| DurationError::InvalidNumber(number.to_string()))?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);
        let scale = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(DurationError::MissingUnit(number.to_string())),
            other => return Err(DurationError::UnknownUnit(other.to_string())),
        };

        nanos += value * scale;
        rest = next;
    }

    Ok(Duration::from_nanos(nanos.round() as u64))
}
