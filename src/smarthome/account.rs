use serde::{Deserialize, Serialize};

use crate::smarthome::{require_text, SmartHome};
use crate::utils::errors::{GatewayError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResult {
    pub token: String,
    pub region: String,
}

#[derive(Serialize)]
struct LoginParams<'a> {
    username: &'a str,
    password: &'a str,
    region: String,
}

impl SmartHome {
    /// Authenticate an account. The region is sent upper-cased.
    pub async fn login(&self, username: &str, password: &str, region: &str) -> Result<LoginResult> {
        let username = require_text(username, "Username cannot be empty")?;
        let password = require_text(password, "Password cannot be empty")?;
        let region = require_text(region, "Region cannot be empty")?;

        let params = LoginParams {
            username,
            password,
            region: region.to_uppercase(),
        };
        self.call("Login", &params)
            .await?
            .ok_or_else(|| GatewayError::NoData("Login failed: no response from server".into()))
    }
}
