//! Exporter configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! command-line flags (which clap also reads from the environment).

use crate::scrape::{candidates_from, default_candidates, InterfaceCandidate, DEFAULT_CANDIDATES};
use serde::{Deserialize, Deserializer};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9100";

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid router IP address: {0}")]
    InvalidRouterIp(String),
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("invalid listen address: {0}")]
    InvalidListenAddr(String),
    #[error("invalid interface candidate: {0:?}")]
    InvalidCandidate(String),
    #[error("failed to read config file: {0}")]
    FileRead(String),
    #[error("failed to parse config file: {0}")]
    Parse(String),
}

/// Everything the exporter needs to reach the router and serve metrics.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Router address, IPv4 or IPv6, without scheme.
    pub router_ip: String,
    /// Web UI user name.
    pub username: String,
    /// Web UI password.
    pub password: String,
    /// Per-request timeout. Accepts `5s`, `500ms` or a bare number of seconds.
    #[serde(deserialize_with = "deserialize_timeout")]
    pub timeout: Duration,
    /// Address the metrics listener binds to. `:9100` means all interfaces.
    pub listen_addr: String,
    /// Ordered device identifiers to probe. Empty means the defaults.
    pub interfaces: Vec<String>,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            router_ip: "127.0.0.1".to_string(),
            username: String::new(),
            password: String::new(),
            timeout: DEFAULT_TIMEOUT,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            interfaces: DEFAULT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl std::fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let password = if self.password.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("ExporterConfig")
            .field("router_ip", &self.router_ip)
            .field("username", &self.username)
            .field("password", &password)
            .field("timeout", &self.timeout)
            .field("listen_addr", &self.listen_addr)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}

/// Values given on the command line or in the environment.
///
/// `None` leaves the underlying value untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Router address.
    pub router_ip: Option<String>,
    /// Web UI user name.
    pub username: Option<String>,
    /// Web UI password.
    pub password: Option<String>,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
    /// Listen address.
    pub listen_addr: Option<String>,
    /// Comma-separated candidate list, e.g. `ETH0,ETH2`.
    pub interfaces: Option<String>,
}

impl ExporterConfig {
    /// Loads configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;
        let config: ExporterConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config)
    }

    /// Applies command-line overrides on top of this configuration.
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(router_ip) = overrides.router_ip {
            self.router_ip = router_ip;
        }
        if let Some(username) = overrides.username {
            self.username = username;
        }
        if let Some(password) = overrides.password {
            self.password = password;
        }
        if let Some(timeout) = overrides.timeout {
            self.timeout = timeout;
        }
        if let Some(listen_addr) = overrides.listen_addr {
            self.listen_addr = listen_addr;
        }
        if let Some(raw) = overrides.interfaces {
            let interfaces: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if !interfaces.is_empty() {
                self.interfaces = interfaces;
            }
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.router_ip
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidRouterIp(self.router_ip.clone()))?;
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("timeout must be positive".to_string()));
        }
        self.listen_socket()?;
        for id in &self.interfaces {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            if !id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            {
                return Err(ConfigError::InvalidCandidate(id.to_string()));
            }
        }
        Ok(())
    }

    /// `http://<router>` with IPv6 addresses bracketed.
    pub fn base_url(&self) -> String {
        let host = self.router_ip.trim();
        match host.parse::<IpAddr>() {
            Ok(IpAddr::V6(v6)) => format!("http://[{v6}]"),
            _ => format!("http://{host}"),
        }
    }

    /// The listen address as a socket address.
    pub fn listen_socket(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.listen_addr.trim();
        let full = if raw.starts_with(':') {
            format!("0.0.0.0{raw}")
        } else {
            raw.to_string()
        };
        full.parse()
            .map_err(|_| ConfigError::InvalidListenAddr(self.listen_addr.clone()))
    }

    /// The candidates to probe, in order.
    pub fn interface_candidates(&self) -> Vec<InterfaceCandidate> {
        let candidates = candidates_from(&self.interfaces);
        if candidates.is_empty() {
            default_candidates()
        } else {
            candidates
        }
    }
}

/// Parses a timeout such as `5s`, `1500ms` or `2m`. A bare number is seconds.
pub fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let raw = raw.trim();
    let timeout = match raw.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(raw)
            .map_err(|e| ConfigError::InvalidTimeout(format!("{raw}: {e}")))?,
    };
    if timeout.is_zero() {
        return Err(ConfigError::InvalidTimeout(format!("{raw}: must be positive")));
    }
    Ok(timeout)
}

fn deserialize_timeout<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTimeout {
        Seconds(u64),
        Text(String),
    }

    match RawTimeout::deserialize(deserializer)? {
        RawTimeout::Seconds(secs) => Ok(Duration::from_secs(secs)),
        RawTimeout::Text(text) => parse_timeout(&text).map_err(serde::de::Error::custom),
    }
}
