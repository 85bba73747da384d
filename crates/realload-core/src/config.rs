//! Plugin arguments and the `realload.toml` daemon config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default instant query: per-node CPU utilization averaged over five minutes.
pub const DEFAULT_QUERY: &str = "node_cpu_usage_avg_5m";
/// Series label carrying the node name.
pub const DEFAULT_NODE_LABEL: &str = "node";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:10261";

/// Arguments for the `CpuRealUsage` plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluginArgs {
    /// Prometheus base URL, e.g. `http://prometheus:9090`. Empty disables sampling.
    #[serde(default)]
    pub prometheus_api_addr: String,
    /// Seconds between two sampling cycles.
    pub query_metric_interval_seconds: u64,
    /// Per-query timeout in seconds.
    pub query_metric_time_seconds: u64,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_node_label")]
    pub node_label: String,
}

fn default_query() -> String {
    DEFAULT_QUERY.to_string()
}

fn default_node_label() -> String {
    DEFAULT_NODE_LABEL.to_string()
}

impl PluginArgs {
    pub fn new(prometheus_api_addr: &str, interval_secs: u64, timeout_secs: u64) -> Self {
        Self {
            prometheus_api_addr: prometheus_api_addr.to_string(),
            query_metric_interval_seconds: interval_secs,
            query_metric_time_seconds: timeout_secs,
            query: default_query(),
            node_label: default_node_label(),
        }
    }

    /// Reject arguments the plugin cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.query_metric_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "query_metric_interval_seconds must be greater than zero".to_string(),
            ));
        }
        if self.query_metric_time_seconds == 0 {
            return Err(ConfigError::Invalid(
                "query_metric_time_seconds must be greater than zero".to_string(),
            ));
        }
        if self.query.trim().is_empty() {
            return Err(ConfigError::Invalid("query must not be empty".to_string()));
        }
        if self.node_label.trim().is_empty() {
            return Err(ConfigError::Invalid("node_label must not be empty".to_string()));
        }
        if self.sampling_enabled() {
            self.prometheus_uri()?;
        }
        Ok(())
    }

    /// Whether a backend address is configured.
    pub fn sampling_enabled(&self) -> bool {
        !self.prometheus_api_addr.trim().is_empty()
    }

    /// The backend address parsed as an `http://` or `https://` base URI.
    pub fn prometheus_uri(&self) -> ConfigResult<http::Uri> {
        let addr = self.prometheus_api_addr.trim();
        let uri: http::Uri = addr
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("prometheus_api_addr {addr:?}: {e}")))?;

        match uri.scheme_str() {
            Some("http" | "https") => {}
            Some(other) => {
                return Err(ConfigError::Invalid(format!(
                    "prometheus_api_addr {addr:?}: unsupported scheme {other:?}, expected http or https"
                )));
            }
            None => {
                return Err(ConfigError::Invalid(format!(
                    "prometheus_api_addr {addr:?}: missing scheme, expected http(s)://host:port"
                )));
            }
        }
        if uri.authority().is_none() {
            return Err(ConfigError::Invalid(format!(
                "prometheus_api_addr {addr:?}: missing host"
            )));
        }
        Ok(uri)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.query_metric_interval_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.query_metric_time_seconds)
    }
}

/// HTTP listener for the scoring API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Top-level `realload.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealloadConfig {
    pub plugin: PluginArgs,
    #[serde(default)]
    pub server: ServerConfig,
}

impl RealloadConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: RealloadConfig = toml::from_str(content)?;
        config.plugin.validate()?;
        Ok(config)
    }
}
