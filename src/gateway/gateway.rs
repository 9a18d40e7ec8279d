//! Gateway orchestration: identity bootstrap, signed client, tool set, MCP server.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::gateway::config::GatewayConfig;
use crate::gateway::service_handle::ServiceHandle;
use crate::identity::DeviceIdentity;
use crate::mcp::{McpServer, ToolSet};
use crate::rpc::SignedRpcClient;
use crate::smarthome::SmartHome;

/// Main Gateway object
pub struct Gateway {
    cfg: GatewayConfig,
}

impl Gateway {
    pub fn new(cfg: GatewayConfig) -> Self {
        Self { cfg }
    }

    /// Build the cloud-facing side of the gateway: identity, signed client and API.
    pub async fn connect(cfg: &GatewayConfig) -> Result<SmartHome> {
        let identity = DeviceIdentity::bootstrap(&cfg.remote.base_url).await;
        info!(device_id = %identity.device_id(), app_id = %identity.app_id(), "device identity");

        if cfg.remote.api_key.is_empty() {
            warn!("API key is empty; the cloud service will likely reject calls");
        }

        let client = SignedRpcClient::new(&cfg.remote, Arc::new(identity))
            .context("building cloud client")?;
        Ok(SmartHome::new(Arc::new(client)))
    }

    /// Start the gateway and return a ServiceHandle for graceful shutdown.
    /// Fails when the listen address cannot be bound.
    pub async fn start(self) -> Result<ServiceHandle> {
        let (mut svc_handle, shutdown_rx) = ServiceHandle::new();

        let home = Self::connect(&self.cfg).await?;

        let default_home = self.cfg.tools.default_home.as_deref();
        if let Some(name) = default_home.filter(|n| !n.trim().is_empty()) {
            match home.switch_home(name).await {
                Ok(()) => info!(home = %name, "switched to default home"),
                Err(e) => warn!(home = %name, err = %e, "could not switch to default home"),
            }
        }

        if self.cfg.auth.enabled && self.cfg.auth.api_token.is_empty() {
            warn!(
                "auth is enabled but no API token is configured; \
                 every MCP request will be rejected"
            );
        }

        let tools = ToolSet::new(home, self.cfg.tools.button_notes.clone());
        let server = McpServer::new(tools, self.cfg.auth.clone());

        let bind = self.cfg.bind_addr();
        let listener = TcpListener::bind(&bind)
            .await
            .with_context(|| format!("binding MCP listener on {}", bind))?;

        svc_handle.spawn(async move {
            server
                .serve(listener, shutdown_rx)
                .await
                .context("MCP server failed")
        });

        info!("Gateway started, MCP: http://{}/mcp", bind);
        Ok(svc_handle)
    }
}
