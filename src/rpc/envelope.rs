//! Wire envelopes for `POST /call` and classification of the replies.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

use crate::utils::errors::{GatewayError, Result};

/// Version string sent in every request envelope.
pub const PROTOCOL_VERSION: &str = "0.0.3";

/// Outbound request body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestEnvelope<P> {
    pub token: String,
    pub version: String,
    #[serde(rename = "fn")]
    pub function: String,
    pub params: P,
    pub device_id: String,
    pub request_id: String,
}

impl<P: Serialize> RequestEnvelope<P> {
    pub fn new(token: &str, device_id: &str, function: &str, params: P) -> Self {
        Self {
            token: token.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            function: function.to_string(),
            params,
            device_id: device_id.to_string(),
            request_id: new_request_id(),
        }
    }
}

/// Fresh random request id: a v4 UUID without hyphens.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Reply body. `code == 0` is the only success value; an absent `code` reads as 0.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResponseEnvelope<T = Value> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default, rename = "msgDetails")]
    pub msg_details: String,
}

impl<T> ResponseEnvelope<T> {
    /// Success payload, or the remote failure with `msgDetails` preferred over `message`.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.code == 0 {
            return Ok(self.result);
        }
        let message = if !self.msg_details.is_empty() {
            self.msg_details
        } else if !self.message.is_empty() {
            self.message
        } else {
            format!("Request failed with code {}", self.code)
        };
        Err(GatewayError::Remote { code: self.code, message })
    }
}

/// Classify an HTTP reply from `/call`.
///
/// Raw bodies are logged, never returned.
pub fn classify_response(function: &str, status: u16, body: &[u8]) -> Result<Option<Value>> {
    if status != 200 {
        error!(
            function,
            status_code = status,
            response = %String::from_utf8_lossy(body),
            "API call failed"
        );
        return Err(GatewayError::Status(status));
    }

    let envelope: ResponseEnvelope<Value> = match serde_json::from_slice(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            error!(
                function,
                err = %e,
                response = %String::from_utf8_lossy(body),
                "JSON parsing failed"
            );
            return Err(GatewayError::InvalidData(recover_message(body)));
        }
    };

    if envelope.code != 0 {
        warn!(function, code = envelope.code, details = %envelope.msg_details, "Request error");
    }
    envelope.into_result()
}

/// Decode a success payload into the caller's type.
pub fn decode_result<T: DeserializeOwned>(
    function: &str,
    result: Option<Value>,
) -> Result<Option<T>> {
    match result {
        None => Ok(None),
        Some(value) => serde_json::from_value(value).map(Some).map_err(|e| {
            error!(function, err = %e, "result has unexpected shape");
            GatewayError::InvalidData(None)
        }),
    }
}

/// Pull a non-empty `message` out of a body that is JSON but not a valid envelope.
fn recover_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
