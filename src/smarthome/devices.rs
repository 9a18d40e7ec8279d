use serde::Serialize;
use serde_json::Value;

use crate::smarthome::{require_items, SmartHome, Slots};
use crate::utils::errors::{GatewayError, Result};

pub const NO_DEVICE_DATA: &str = "No device data available";
pub const NO_DEVICE_STATUS: &str = "No device status data available";
pub const NO_DEVICE_LOGS: &str = "No device log data available";
pub const DEVICE_CONTROL_OK: &str = "Device control success";

#[derive(Serialize)]
struct DeviceFilter<'a> {
    positions: &'a [String],
    device_types: &'a [String],
}

#[derive(Serialize)]
struct DeviceControlParams<'a> {
    devices: &'a [i64],
    slots: [&'a Slots; 1],
}

#[derive(Serialize)]
struct DeviceLogParams<'a> {
    devices: &'a [i64],
    time_span: Vec<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    attributes: &'a [String],
}

impl SmartHome {
    /// Send one control command (`slots`) to every endpoint in `devices`.
    pub async fn device_control(&self, devices: &[i64], slots: &Slots) -> Result<()> {
        require_items(devices, "Device list cannot be empty")?;
        if slots.is_empty() {
            return Err(GatewayError::validation("Control parameters cannot be empty"));
        }
        let params = DeviceControlParams { devices, slots: [slots] };
        let _: Option<Value> = self.call("DeviceControl", &params).await?;
        Ok(())
    }

    /// Devices matching positions and device types; empty filters match everything.
    pub async fn device_query(
        &self,
        positions: &[String],
        device_types: &[String],
    ) -> Result<String> {
        let result: Option<String> = self
            .call("DeviceQuery", &DeviceFilter { positions, device_types })
            .await?;
        Ok(result.unwrap_or_else(|| NO_DEVICE_DATA.to_string()))
    }

    pub async fn device_status_query(
        &self,
        positions: &[String],
        device_types: &[String],
    ) -> Result<String> {
        let result: Option<String> = self
            .call("DeviceStatusQuery", &DeviceFilter { positions, device_types })
            .await?;
        Ok(result.unwrap_or_else(|| NO_DEVICE_STATUS.to_string()))
    }

    /// Historical log of `devices`. Blank datetimes are left out of the time span
    /// and attributes are only sent when given.
    pub async fn device_log_query(
        &self,
        devices: &[i64],
        start_datetime: &str,
        end_datetime: &str,
        attributes: &[String],
    ) -> Result<String> {
        require_items(devices, "Device list cannot be empty")?;

        let time_span = [start_datetime.trim(), end_datetime.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        let params = DeviceLogParams { devices, time_span, attributes };

        let result: Option<String> = self.call("DeviceLogQuery", &params).await?;
        Ok(result.unwrap_or_else(|| NO_DEVICE_LOGS.to_string()))
    }
}
