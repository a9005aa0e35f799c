//! Layered application configuration
//!
//! Precedence, lowest first: built-in defaults, YAML file, environment
//! (`ADD__SECTION__KEY`), CLI overrides.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use add::GatewayConfig;
use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "ADD__";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub tracing: TracingConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracingConfig {
    pub enabled: bool,
    pub service_name: String,
    /// OTLP gRPC collector endpoint
    pub endpoint: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "add-gateway".to_owned(),
            endpoint: "http://127.0.0.1:4317".to_owned(),
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` (if any), then the environment.
    ///
    /// # Errors
    /// Returns an error if `path` does not exist or the merged configuration
    /// does not deserialize.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        figment.extract().context("invalid configuration")
    }

    /// Apply command-line overrides on top of the loaded configuration.
    ///
    /// `verbose` raises the log level: 1 = info, 2 = debug, 3+ = trace.
    pub fn apply_cli_overrides(&mut self, bind: Option<SocketAddr>, verbose: u8) {
        if let Some(addr) = bind {
            self.server.bind_addr = addr;
        }
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// Render the effective configuration.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize configuration")
    }
}
