//! Typed wrappers over the home cloud functions.
//!
//! Each wrapper validates its required arguments first and returns a
//! `Validation` error without touching the network when one is blank or
//! empty. Query-style wrappers map a missing result to a fixed "no data"
//! sentence; action wrappers return `()` on success.

pub mod account;
pub mod automation;
pub mod devices;
pub mod homes;
pub mod scenes;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::rpc::client::ServiceCaller;
use crate::rpc::envelope::decode_result;
use crate::utils::errors::{GatewayError, Result};

pub use account::LoginResult;

/// A JSON object of control slot values, e.g. `{"on_off": 1}`.
pub type Slots = serde_json::Map<String, serde_json::Value>;

/// Home cloud API bound to one caller.
#[derive(Clone)]
pub struct SmartHome {
    caller: Arc<dyn ServiceCaller>,
}

impl SmartHome {
    pub fn new(caller: Arc<dyn ServiceCaller>) -> Self {
        Self { caller }
    }

    async fn call<P, T>(&self, function: &str, params: &P) -> Result<Option<T>>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(GatewayError::Serialize)?;
        let raw = self.caller.call_service(function, params).await?;
        decode_result(function, raw)
    }
}

/// Trimmed `value`, or a validation error carrying `message` when it is blank.
fn require_text<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GatewayError::validation(message))
    } else {
        Ok(trimmed)
    }
}

fn require_items<T>(items: &[T], message: &str) -> Result<()> {
    if items.is_empty() {
        Err(GatewayError::validation(message))
    } else {
        Ok(())
    }
}
