//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.
//! Defaults reproduce the stock development setup: UI assets under
//! `/frontend` on port 8080, everything else to the API server on 3000.

use serde::{Deserialize, Serialize};

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "PORT";

/// Listening port used when neither the config nor `PORT` provide one.
pub const DEFAULT_PORT: u16 = 5100;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host and port).
    pub listener: ListenerConfig,

    /// Origin used when no route matches.
    pub default_target: String,

    /// Ordered route definitions. First match wins.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            default_target: "http://localhost:3000".to_string(),
            routes: vec![RouteConfig {
                name: Some("frontend".to_string()),
                prefix: "/frontend".to_string(),
                target: "http://localhost:8080".to_string(),
                preserve_path: true,
            }],
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port to listen on.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// A single prefix → origin rule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics. Defaults to the prefix.
    #[serde(default)]
    pub name: Option<String>,

    /// Path prefix to match (case-sensitive, literal).
    pub prefix: String,

    /// Origin to forward to, e.g. "http://localhost:8080".
    pub target: String,

    /// Forward the path as received (true) or with the prefix removed (false).
    #[serde(default = "default_preserve_path")]
    pub preserve_path: bool,
}

fn default_preserve_path() -> bool {
    true
}

/// Timeout configuration for upstream traffic.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the origin to send its response head, in seconds.
    pub response_secs: u64,

    /// Maximum silence between two response body chunks, in seconds.
    pub idle_secs: u64,

    /// How long a pooled upstream connection may sit unused, in seconds.
    pub pool_idle_secs: u64,

    /// How long open client connections may keep draining after a shutdown
    /// signal before they are closed, in seconds. Zero closes them at once.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 60,
            idle_secs: 60,
            pool_idle_secs: 90,
            shutdown_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable lines or one JSON object per line.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ProxyConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.port, DEFAULT_PORT);
        assert_eq!(config.default_target, "http://localhost:3000");
        assert_eq!(config.routes.len(), 1);
        assert_eq!(config.routes[0].prefix, "/frontend");
        assert!(config.routes[0].preserve_path);
    }

    #[test]
    fn explicit_routes_replace_defaults() {
        let config: ProxyConfig = toml::from_str(
            r#"
            default_target = "http://127.0.0.1:4000"

            [listener]
            port = 6000

            [[routes]]
            prefix = "/assets"
            target = "http://127.0.0.1:4100"
            preserve_path = false

            [[routes]]
            name = "docs"
            prefix = "/docs"
            target = "http://127.0.0.1:4200"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.listener.port, 6000);
        assert_eq!(config.routes.len(), 2);
        assert!(!config.routes[0].preserve_path);
        assert!(config.routes[1].preserve_path);
        assert_eq!(config.routes[1].name.as_deref(), Some("docs"));
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn bind_address_brackets_ipv6() {
        let listener = ListenerConfig {
            host: "::1".to_string(),
            port: 5100,
        };
        assert_eq!(listener.bind_address(), "[::1]:5100");
        assert_eq!(ListenerConfig::default().bind_address(), "0.0.0.0:5100");
    }
}
