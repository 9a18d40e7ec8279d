use std::collections::HashMap;

use reqwest::Client;
use tracing::error;

use crate::utils::errors::{GatewayError, Result};

/// Fetch the signing secret for `app_id` with an unsigned `GET {base_url}/secret?key=...`.
pub async fn fetch_secret(http: &Client, base_url: &str, app_id: &str) -> Result<String> {
    let url = format!("{}/secret", base_url.trim_end_matches('/'));

    let resp = http
        .get(&url)
        .query(&[("key", app_id)])
        .send()
        .await
        .map_err(|e| {
            error!(url = %url, err = %e, "Failed to send GET request");
            GatewayError::Transport(e.to_string())
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status.as_u16()));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| GatewayError::ReadBody(e.to_string()))?;

    let fields: HashMap<String, serde_json::Value> = serde_json::from_slice(&body).map_err(|e| {
        error!(err = %e, response = %String::from_utf8_lossy(&body), "JSON parsing failed");
        GatewayError::InvalidData(None)
    })?;

    fields
        .get("secret_key")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::InvalidData(Some("Secret key not found in response".into())))
}
