/// Configuration management for the API server
///
/// Configuration is read from environment variables (optionally from a `.env`
/// file) into a typed [`Config`].
///
/// # Environment Variables
///
/// | Variable | Default |
/// |---|---|
/// | `API_HOST` | `0.0.0.0` |
/// | `API_PORT` | `8080` |
/// | `CORS_ORIGINS` | `*` (comma separated list otherwise) |
/// | `API_PRODUCTION` | `false` |
/// | `STORAGE_BACKEND` | `postgres` (or `memory`) |
/// | `DATABASE_URL` | required when the backend is `postgres` |
/// | `DATABASE_MAX_CONNECTIONS` | `10` |
/// | `SESSION_COOKIE_NAME` | `taskflow_session` |
/// | `SESSION_TTL_HOURS` | `168` (at most ten years) |
/// | `AUTH_AUTO_PROVISION` | `true` |
/// | `LOG_FORMAT` | `pretty` (or `json`) |
///
/// # Example
///
/// ```no_run
/// use taskflow_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Upper bound for `SESSION_TTL_HOURS` (ten years)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub log_format: LogFormat,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,

    /// Enables HSTS and `Secure` cookies
    pub production: bool,
}

/// Which store implementation backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => anyhow::bail!("Unknown STORAGE_BACKEND '{}', expected postgres or memory", other),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// PostgreSQL connection URL; `None` for the memory backend
    pub database_url: Option<String>,

    pub max_connections: u32,
}

/// Session cookie and login behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,

    /// Create accounts on first login with an unknown username
    pub auto_provision: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable has an invalid value, or `DATABASE_URL`
    /// is missing while the backend is `postgres`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a port number")?;

        let cors_origins = get("CORS_ORIGINS", "*")
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = parse_bool("API_PRODUCTION", &get("API_PRODUCTION", "false"))?;

        let backend: StorageBackend = get("STORAGE_BACKEND", "postgres").parse()?;
        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL environment variable is required for the postgres backend");
        }

        let max_connections = get("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let ttl_hours = get("SESSION_TTL_HOURS", "168")
            .parse::<i64>()
            .context("SESSION_TTL_HOURS must be an integer")?;
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&ttl_hours) {
            anyhow::bail!(
                "SESSION_TTL_HOURS must be between 1 and {}",
                MAX_SESSION_TTL_HOURS
            );
        }

        let cookie_name = get("SESSION_COOKIE_NAME", "taskflow_session");
        if cookie_name.is_empty() || !cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            anyhow::bail!("SESSION_COOKIE_NAME may only contain letters, digits, '_' and '-'");
        }

        let auto_provision = parse_bool("AUTH_AUTO_PROVISION", &get("AUTH_AUTO_PROVISION", "true"))?;

        let log_format = match get("LOG_FORMAT", "pretty").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => anyhow::bail!("Unknown LOG_FORMAT '{}', expected pretty or json", other),
        };

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST", "0.0.0.0"),
                port,
                cors_origins,
                production,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
            },
            session: SessionConfig {
                cookie_name,
                ttl_hours,
                auto_provision,
            },
            log_format,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// True if CORS should allow any origin
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be a boolean, got '{}'", key, other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_backend() {
        let config = config_from(&[("STORAGE_BACKEND", "memory")]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.cors_permissive());
        assert!(!config.api.production);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.database_url, None);
        assert_eq!(config.session.cookie_name, "taskflow_session");
        assert_eq!(config.session.ttl_hours, 168);
        assert!(config.session.auto_provision);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let config = config_from(&[("DATABASE_URL", "postgresql://localhost/taskflow")]).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.storage.max_connections, 10);
    }

    #[test]
    fn test_explicit_values() {
        let config = config_from(&[
            ("STORAGE_BACKEND", "memory"),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("API_PRODUCTION", "true"),
            ("SESSION_TTL_HOURS", "2"),
            ("AUTH_AUTO_PROVISION", "false"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.cors_permissive());
        assert!(config.api.production);
        assert_eq!(config.session.ttl_hours, 2);
        assert!(!config.session.auto_provision);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_session_ttl_upper_bound() {
        let max = MAX_SESSION_TTL_HOURS.to_string();
        let config = config_from(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_HOURS", max.as_str())]).unwrap();
        assert_eq!(config.session.ttl_hours, MAX_SESSION_TTL_HOURS);

        let over = (MAX_SESSION_TTL_HOURS + 1).to_string();
        let err = config_from(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_HOURS", over.as_str())]).unwrap_err();
        assert!(err.to_string().contains("SESSION_TTL_HOURS"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("STORAGE_BACKEND", "redis")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "memory"), ("API_PORT", "http")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_HOURS", "0")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "memory"), ("API_PRODUCTION", "maybe")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "memory"), ("SESSION_TTL_HOURS", "10000000000")]).is_err());
        assert!(config_from(&[("STORAGE_BACKEND", "memory"), ("SESSION_COOKIE_NAME", "a b")]).is_err());
    }
}
