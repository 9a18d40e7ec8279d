use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::gateway::config::GatewayConfig;
use crate::gateway::service_handle::shutdown_signal;
use crate::gateway::Gateway;
use crate::identity::DeviceIdentity;
use crate::utils::init_logging;

/// CLI for the smart-home MCP gateway.
#[derive(Parser, Debug)]
#[clap(name = "yalla", version)]
pub struct Cli {
    /// Path to a TOML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Cloud service base URL
    #[clap(long, env = "YALLA_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// API key forwarded to the cloud service
    #[clap(long, env = "API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Default log filter (RUST_LOG takes precedence)
    #[clap(long, env = "YALLA_LOG", global = true)]
    pub log_level: Option<String>,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Run the MCP gateway
    Serve {
        #[clap(long, env = "HOST")]
        host: Option<String>,

        #[clap(long, env = "PORT")]
        port: Option<u16>,

        /// Bearer token MCP clients must present
        #[clap(long, env = "API_TOKEN", hide_env_values = true)]
        api_token: Option<String>,

        /// Home to switch to once at startup
        #[clap(long, env = "YALLA_DEFAULT_HOME")]
        default_home: Option<String>,

        /// Accept MCP requests without a bearer token
        #[clap(long)]
        no_auth: bool,
    },
    /// Print this host's device id and application id
    Identity,
    /// Log in to the cloud service and print the session token
    Login {
        #[clap(long)]
        username: String,

        #[clap(long, env = "YALLA_PASSWORD", hide_env_values = true)]
        password: String,

        #[clap(long, default_value = "CN")]
        region: String,
    },
}

impl Cli {
    /// Config file (or defaults) with command-line and env values applied on top.
    pub fn resolve_config(&self) -> Result<GatewayConfig> {
        let mut cfg = match &self.config {
            Some(path) => GatewayConfig::load(path)?,
            None => GatewayConfig::default(),
        };
        if let Some(url) = &self.base_url {
            cfg.remote.base_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            cfg.remote.api_key = key.clone();
        }
        if let Some(level) = &self.log_level {
            cfg.log_level = level.clone();
        }
        if let Cmd::Serve { host, port, api_token, default_home, no_auth } = &self.cmd {
            if let Some(h) = host {
                cfg.server.host = h.clone();
            }
            if let Some(p) = port {
                cfg.server.port = *p;
            }
            if let Some(t) = api_token {
                cfg.auth.api_token = t.clone();
            }
            if let Some(home) = default_home {
                cfg.tools.default_home = Some(home.clone());
            }
            if *no_auth {
                cfg.auth.enabled = false;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let cfg = cli.resolve_config().context("loading configuration")?;
    init_logging(&cfg.log_level);

    match cli.cmd {
        Cmd::Serve { .. } => {
            let gateway = Gateway::new(cfg);
            let svc = gateway.start().await?;
            svc.run_until(shutdown_signal()).await?;
            println!("Gateway stopped");
            Ok(())
        }
        Cmd::Identity => {
            let identity = DeviceIdentity::local();
            println!("device_id: {}", identity.device_id());
            println!("app_id:    {}", identity.app_id());
            Ok(())
        }
        Cmd::Login { username, password, region } => {
            let home = Gateway::connect(&cfg).await?;
            let login = home.login(&username, &password, &region).await?;
            println!("token:  {}", login.token);
            println!("region: {}", login.region);
            Ok(())
        }
    }
}
