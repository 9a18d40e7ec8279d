//! Device identity: the fingerprint and signing secret this gateway presents
//! to the cloud service.
//!
//! - Fingerprint: device id from the first usable MAC (or a generated UUID),
//!   application id derived from the device id
//! - Secret: fetched once at startup; an unreachable secret endpoint leaves
//!   the secret empty and requests go out unsigned
//!
//! Build one `DeviceIdentity` during bootstrap and share it by `Arc`.

pub mod fingerprint;
pub mod interfaces;
pub mod secret;

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::utils::errors::{GatewayError, Result};

pub use fingerprint::{app_id, device_id, DeviceSeed};
pub use interfaces::NetInterface;

/// Timeout for the startup secret fetch.
pub const SECRET_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    device_id: String,
    app_id: String,
    secret: String,
}

impl DeviceIdentity {
    /// Identity for `device_id` with the application id derived from it.
    pub fn new(device_id: impl Into<String>, secret: impl Into<String>) -> Self {
        let device_id = device_id.into();
        Self {
            app_id: app_id(&device_id),
            device_id,
            secret: secret.into(),
        }
    }

    /// Fingerprint this host. No network access; the secret is empty.
    pub fn local() -> Self {
        let seed = DeviceSeed::from_interfaces(&interfaces::list_interfaces());
        let id = device_id(&seed, &fingerprint::hostname(), &fingerprint::host_platform());
        Self::new(id, "")
    }

    /// Fingerprint this host and fetch the signing secret.
    ///
    /// Never fails: a secret that cannot be fetched is logged and left empty.
    pub async fn bootstrap(base_url: &str) -> Self {
        let identity = Self::local();
        let secret = match Self::secret_client() {
            Ok(http) => secret::fetch_secret(&http, base_url, &identity.app_id).await,
            Err(e) => Err(e),
        };
        match secret {
            Ok(secret) if !secret.is_empty() => {
                info!(
                    device_id = %identity.device_id,
                    app_id = %identity.app_id,
                    "device identity ready"
                );
                identity.with_secret(secret)
            }
            Ok(_) => {
                warn!("No secret returned from server; requests will be unsigned");
                identity
            }
            Err(e) => {
                warn!(err = %e, "Failed to fetch signing secret; requests will be unsigned");
                identity
            }
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    fn secret_client() -> Result<Client> {
        Client::builder()
            .timeout(SECRET_FETCH_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))
    }
}

impl fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("device_id", &self.device_id)
            .field("app_id", &self.app_id)
            .field("secret", &if self.has_secret() { "<redacted>" } else { "" })
            .finish()
    }
}
