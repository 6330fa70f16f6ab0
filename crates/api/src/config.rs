use std::path::PathBuf;

use sentinel_core::config::MonitorConfig;
use sentinel_core::error::CoreError;

/// Failure while assembling [`ServerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}'")]
    InvalidVar { var: &'static str, value: String },

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Monitor(#[from] CoreError),
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to stop after the server does (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// PostgreSQL URL. Without one, readings and alerts are kept in memory.
    pub database_url: Option<String>,
    /// Thresholds, cooldown, analytics and retention settings.
    pub monitor: MonitorConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                       |
    /// | `DATABASE_URL`         | unset (in-memory store)    |
    /// | `SENTINEL_CONFIG`      | unset (built-in defaults)  |
    /// | `ALERT_COOLDOWN_SECS`  | from config file, or `300` |
    /// | `ANOMALY_K`            | from config file, or `2.0` |
    /// | `READING_RETENTION_DAYS` | from config file, or `30` |
    /// | `ALERT_RETENTION_DAYS` | from config file, or `90`  |
    ///
    /// `SENTINEL_CONFIG` names a YAML file holding a partial `MonitorConfig`;
    /// the overrides above are applied on top of it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var(&lookup, "PORT")?.unwrap_or(3000);

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?.unwrap_or(30);
        let shutdown_timeout_secs: u64 =
            parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS")?.unwrap_or(30);

        let database_url = lookup("DATABASE_URL").filter(|s| !s.trim().is_empty());

        let mut monitor = match lookup("SENTINEL_CONFIG") {
            Some(path) => load_monitor_config(PathBuf::from(path))?,
            None => MonitorConfig::default(),
        };
        if let Some(secs) = parse_var(&lookup, "ALERT_COOLDOWN_SECS")? {
            monitor.cooldown_secs = secs;
        }
        if let Some(k) = parse_var(&lookup, "ANOMALY_K")? {
            monitor.anomaly_k = k;
        }
        if let Some(days) = parse_var(&lookup, "READING_RETENTION_DAYS")? {
            monitor.reading_retention_days = days;
        }
        if let Some(days) = parse_var(&lookup, "ALERT_RETENTION_DAYS")? {
            monitor.alert_retention_days = days;
        }
        monitor.validate()?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            database_url,
            monitor,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidVar { var, value }),
    }
}

/// Read a YAML monitor configuration file. Missing fields take defaults.
pub fn load_monitor_config(path: PathBuf) -> Result<MonitorConfig, ConfigError> {
    let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
}
