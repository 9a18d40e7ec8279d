use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::errors::{GatewayError, Result};

pub const DEFAULT_BASE_URL: &str = "https://ai-echo.aqara.cn/echo/mcp";

/// Gateway configuration. Every section has defaults, so an empty TOML file is valid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub auth: AuthConfig,
    pub tools: ToolsConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            remote: RemoteConfig::default(),
            auth: AuthConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .map_err(|e| GatewayError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self> {
        toml::from_str(data).map_err(|e| GatewayError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(GatewayError::Config("server.host cannot be empty".into()));
        }
        if self.server.port == 0 {
            return Err(GatewayError::Config("server.port cannot be 0".into()));
        }
        if self.remote.base_url.trim().is_empty() {
            return Err(GatewayError::Config("remote.base_url cannot be empty".into()));
        }
        if self.remote.timeout_secs == 0 {
            return Err(GatewayError::Config("remote.timeout_secs cannot be 0".into()));
        }
        Ok(())
    }

    /// `host:port` for the inbound listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Inbound MCP listener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Cloud service endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Forwarded as `token` in every request envelope
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 10,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bearer-token gate on the MCP endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    /// When false the endpoint is open. Only for local development.
    pub enabled: bool,
    pub api_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_token: String::new(),
        }
    }
}

impl AuthConfig {
    pub fn disabled() -> Self {
        Self { enabled: false, api_token: String::new() }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self { enabled: true, api_token: token.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolsConfig {
    /// Home to switch to once at startup
    pub default_home: Option<String>,
    /// Free-form notes about the household appended to the button listing tool description
    pub button_notes: String,
}
