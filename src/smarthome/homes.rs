use serde::Serialize;
use serde_json::Value;

use crate::smarthome::{require_text, SmartHome};
use crate::utils::errors::Result;

#[derive(Serialize)]
struct SwitchHomeParams<'a> {
    home_name: &'a str,
}

impl SmartHome {
    /// Names of all homes under the account. A success without a result is an
    /// empty list.
    pub async fn get_homes(&self) -> Result<Vec<String>> {
        let homes: Option<Vec<String>> = self.call("GetHomes", &Value::Null).await?;
        Ok(homes.unwrap_or_default())
    }

    /// Make `home_name` the account's current home. Only `code` decides the
    /// outcome; the result payload is ignored.
    pub async fn switch_home(&self, home_name: &str) -> Result<()> {
        let home_name = require_text(home_name, "Home name cannot be empty")?;
        let _: Option<Value> = self
            .call("SwitchHome", &SwitchHomeParams { home_name })
            .await?;
        Ok(())
    }
}
