//! Environment-driven application configuration.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::domain::ConfigError;
use crate::infra::PostgresConfig;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Runtime configuration for the server process.
#[derive(Debug)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub bind_addr: SocketAddr,
    pub log_format: LogFormat,
    pub database: PostgresConfig,
    /// Time allowed for a readiness probe to validate its connection
    pub health_probe_timeout: Duration,
    pub request_timeout: Duration,
    pub run_migrations: bool,
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let pool_defaults = PostgresConfig::default();
        let database = PostgresConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", pool_defaults.max_connections)?,
            min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", pool_defaults.min_connections)?,
            acquire_timeout: Duration::from_secs(parse_or(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                pool_defaults.acquire_timeout.as_secs(),
            )?),
            ..pool_defaults
        };

        if database.min_connections > database.max_connections {
            return Err(ConfigError::InvalidValue {
                key: "DB_MIN_CONNECTIONS".to_string(),
                message: format!(
                    "must not exceed DB_MAX_CONNECTIONS ({})",
                    database.max_connections
                ),
            });
        }

        Ok(Self {
            database_url: SecretString::from(database_url),
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::default())?,
            database,
            health_probe_timeout: Duration::from_secs(parse_or(
                &lookup,
                "HEALTH_PROBE_TIMEOUT_SECS",
                1,
            )?),
            request_timeout: Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?),
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            metrics_enabled: parse_or(&lookup, "METRICS_ENABLED", true)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
        _ => Ok(default),
    }
}
