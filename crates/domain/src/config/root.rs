use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use super::backend::{BackendConfig, BackendKind};
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::resolver::ResolverConfig;
use super::server::ServerConfig;

/// Main configuration structure for kvdns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (port, bind address)
    #[serde(default)]
    pub server: ServerConfig,

    /// Zones, fallthrough and lookup strategy
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Key-value backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. kvdns.toml in current directory
    /// 3. /etc/kvdns/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("kvdns.toml").exists() {
            Self::from_file("kvdns.toml")?
        } else if std::path::Path::new("/etc/kvdns/config.toml").exists() {
            Self::from_file("/etc/kvdns/config.toml")?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply command-line overrides to configuration
    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if !overrides.zones.is_empty() {
            self.resolver.zones = overrides.zones;
        }
        if let Some(table) = overrides.table {
            self.backend.table = table;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.backend.endpoint = Some(endpoint);
            self.backend.kind = BackendKind::Http;
        }
        if overrides.insecure {
            self.backend.insecure = true;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.backend.table.trim().is_empty() {
            return Err(ConfigError::Validation(
                "missing backend table configuration".to_string(),
            ));
        }

        if self.resolver.zones.is_empty() {
            return Err(ConfigError::Validation("No zones configured".to_string()));
        }

        if self.backend.kind == BackendKind::Http
            && self.backend.endpoint.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigError::Validation(
                "http backend requires an endpoint".to_string(),
            ));
        }

        for addr in self.resolver.upstream.iter().chain(&self.resolver.forward) {
            addr.parse::<SocketAddr>().map_err(|e| {
                ConfigError::Validation(format!("Invalid resolver address '{}': {}", addr, e))
            })?;
        }

        if self.resolver.query_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "query_timeout_ms cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn dns_bind_address(&self) -> String {
        if self.server.bind_address.contains(':') {
            format!("[{}]:{}", self.server.bind_address, self.server.dns_port)
        } else {
            format!("{}:{}", self.server.bind_address, self.server.dns_port)
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub zones: Vec<String>,
    pub table: Option<String>,
    pub endpoint: Option<String>,
    pub insecure: bool,
    pub log_level: Option<String>,
}
