//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Error reading the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {var}={value:?}: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub message: String,
}

/// Startup configuration for the server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Directory of `<line>_horaires.json` files
    pub data_dir: PathBuf,

    /// Listen address
    pub bind: SocketAddr,

    /// Base URL of an OSRM-compatible router. Unset means estimates only.
    pub routing_url: Option<String>,

    /// Per-call geometry timeout
    pub routing_timeout: Duration,

    /// Time-to-live of the stop and line caches
    pub schedule_cache_ttl: Duration,

    /// Interval of the background reload, if any
    pub refresh_interval: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            routing_url: None,
            routing_timeout: Duration::from_millis(3000),
            schedule_cache_ttl: Duration::from_secs(600),
            refresh_interval: None,
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let data_dir = get("TRANSIT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let bind = parse_var("TRANSIT_BIND", get("TRANSIT_BIND"))?.unwrap_or(defaults.bind);
        let routing_url = get("ROUTING_URL").map(|url| url.trim_end_matches('/').to_string());
        let routing_timeout = parse_var::<u64>("ROUTING_TIMEOUT_MS", get("ROUTING_TIMEOUT_MS"))?
            .map(Duration::from_millis)
            .unwrap_or(defaults.routing_timeout);
        let schedule_cache_ttl =
            parse_var::<u64>("SCHEDULE_CACHE_TTL_SECS", get("SCHEDULE_CACHE_TTL_SECS"))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.schedule_cache_ttl);

        let refresh_interval =
            match parse_var::<u64>("SCHEDULE_REFRESH_SECS", get("SCHEDULE_REFRESH_SECS"))? {
                Some(0) => {
                    return Err(ConfigError {
                        var: "SCHEDULE_REFRESH_SECS",
                        value: "0".to_string(),
                        message: "interval must be positive".to_string(),
                    });
                }
                secs => secs.map(Duration::from_secs),
            };

        Ok(Self {
            data_dir,
            bind,
            routing_url,
            routing_timeout,
            schedule_cache_ttl,
            refresh_interval,
        })
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim().parse().map_err(|e: T::Err| ConfigError {
                var,
                message: e.to_string(),
                value: v,
            })
        })
        .transpose()
}
