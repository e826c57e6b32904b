//! Runtime configuration, read once from the environment at startup.
//!
//! `dotenvy` loads a `.env` file first if one is present, so every value below can come from
//! either place. Only `DATABASE_URL` and `SECRET_KEY` are required.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
/// 90 days.
pub const DEFAULT_TOKEN_TTL_MINUTES: u64 = 60 * 24 * 90;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    /// Value for `Access-Control-Allow-Origin`; `*` allows any origin.
    pub cors_allow_origin: String,
}

/// Connection pool settings.
///
/// `pool_size` connections are kept open; up to `max_overflow` more are opened under load.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub acquire_timeout: Duration,
    pub connect_timeout: Duration,
    /// Connections older than this are closed and replaced.
    pub recycle: Duration,
    pub pre_ping: bool,
}

/// Signing material for bearer tokens. Handed to the session component by reference.
#[derive(Clone)]
pub struct SessionConfig {
    pub secret_key: String,
    pub token_ttl: Duration,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    pub json_logs: bool,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any name → value source. `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?
            .ok_or(ConfigError::Missing("BIND_ADDR"))?;

        let database_url = match lookup("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Err(ConfigError::Missing("DATABASE_URL")),
        };

        let secret_key = match lookup("SECRET_KEY") {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ConfigError::Missing("SECRET_KEY")),
        };

        let ttl_minutes: u64 = parse_var(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", Some(DEFAULT_TOKEN_TTL_MINUTES))?
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        let token_ttl = token_ttl(ttl_minutes)?;

        let database = DatabaseConfig {
            url: database_url,
            pool_size: parse_var(&lookup, "DB_POOL_SIZE", Some(5))?.unwrap_or(5),
            max_overflow: parse_var(&lookup, "DB_MAX_OVERFLOW", Some(10))?.unwrap_or(10),
            acquire_timeout: Duration::from_secs(
                parse_var(&lookup, "DB_POOL_TIMEOUT_SECS", Some(30))?.unwrap_or(30),
            ),
            connect_timeout: Duration::from_secs(
                parse_var(&lookup, "DB_CONNECT_TIMEOUT_SECS", Some(10))?.unwrap_or(10),
            ),
            recycle: Duration::from_secs(
                parse_var(&lookup, "DB_POOL_RECYCLE_SECS", Some(3600))?.unwrap_or(3600),
            ),
            pre_ping: parse_flag(&lookup, "DB_POOL_PRE_PING", true)?,
        };

        let telemetry = TelemetryConfig {
            json_logs: lookup("RUST_LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|e| !e.trim().is_empty()),
        };

        Ok(Config {
            bind_addr,
            database,
            session: SessionConfig { secret_key, token_ttl },
            telemetry,
            cors_allow_origin: lookup("CORS_ALLOW_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

/// Token lifetime in minutes, bounded so that `now + ttl` stays a representable timestamp.
fn token_ttl(minutes: u64) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::Invalid {
        name: "ACCESS_TOKEN_EXPIRE_MINUTES",
        value: minutes.to_string(),
        reason: "token lifetime is out of range".to_string(),
    };

    let ttl = minutes.checked_mul(60).map(Duration::from_secs).ok_or_else(invalid)?;
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| chrono::Utc::now().checked_add_signed(delta))
        .ok_or_else(invalid)?;
    Ok(ttl)
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: Option<T>) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        _ => Ok(default),
    }
}

/// Accepts `true`/`false`, `yes`/`no`, `on`/`off` and `1`/`0`, in any case.
fn parse_flag<F>(lookup: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(name).filter(|s| !s.trim().is_empty()) else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "expected true or false".to_string(),
        }),
    }
}
