use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::gateway::config::RemoteConfig;
use crate::identity::DeviceIdentity;
use crate::rpc::envelope::{classify_response, decode_result, RequestEnvelope};
use crate::rpc::signing::{unix_timestamp, SignatureHeaders};
use crate::utils::errors::{GatewayError, Result};
use crate::utils::metrics::{METRICS, RPC_CALLS, RPC_FAILURES};

/// Client-side timeout for one `/call` exchange.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Something that can invoke a named cloud function.
///
/// `Ok(None)` means the call succeeded without a result payload. The error's
/// `Display` is the message meant for the end user.
#[async_trait]
pub trait ServiceCaller: Send + Sync + 'static {
    async fn call_service(&self, function: &str, params: Value) -> Result<Option<Value>>;
}

/// Signs and posts envelopes to `{base_url}/call`.
///
/// Stateless apart from the shared identity; safe to call concurrently.
pub struct SignedRpcClient {
    http: Client,
    call_url: Url,
    api_key: String,
    identity: Arc<DeviceIdentity>,
}

impl SignedRpcClient {
    pub fn new(remote: &RemoteConfig, identity: Arc<DeviceIdentity>) -> Result<Self> {
        let call_url = Url::parse(&format!("{}/call", remote.base_url.trim_end_matches('/')))
            .map_err(|e| {
                GatewayError::Config(format!("invalid base_url {:?}: {}", remote.base_url, e))
            })?;

        let http = Client::builder()
            .timeout(remote.timeout())
            .build()
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        Ok(Self {
            http,
            call_url,
            api_key: remote.api_key.clone(),
            identity,
        })
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Call `function` and decode the result payload as `T`.
    pub async fn call<P, T>(&self, function: &str, params: P) -> Result<Option<T>>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let raw = self.post(function, params).await?;
        decode_result(function, raw)
    }

    async fn post<P: Serialize>(&self, function: &str, params: P) -> Result<Option<Value>> {
        METRICS.inc_counter(RPC_CALLS);
        let outcome = self.exchange(function, params).await;
        if outcome.is_err() {
            METRICS.inc_counter(RPC_FAILURES);
        }
        outcome
    }

    async fn exchange<P: Serialize>(&self, function: &str, params: P) -> Result<Option<Value>> {
        let envelope =
            RequestEnvelope::new(&self.api_key, self.identity.device_id(), function, params);
        let body = serde_json::to_vec(&envelope).map_err(GatewayError::Serialize)?;

        let signature = SignatureHeaders::sign(
            self.identity.secret(),
            self.identity.app_id(),
            "POST",
            &request_uri(&self.call_url),
            unix_timestamp(),
            &body,
        );

        debug!(
            function,
            request_id = %envelope.request_id,
            signed = !signature.signature.is_empty(),
            "calling cloud service"
        );

        let resp = self
            .http
            .post(self.call_url.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .headers(signature.to_header_map())
            .body(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::ReadBody(e.to_string()))?;

        classify_response(function, status, &bytes)
    }
}

#[async_trait]
impl ServiceCaller for SignedRpcClient {
    async fn call_service(&self, function: &str, params: Value) -> Result<Option<Value>> {
        self.post(function, params).await
    }
}

/// Path plus query of `url`, the form that is signed.
pub fn request_uri(url: &Url) -> String {
    match url.query() {
        Some(q) => format!("{}?{}", url.path(), q),
        None => url.path().to_string(),
    }
}
