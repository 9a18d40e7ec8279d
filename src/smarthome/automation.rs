use serde::Serialize;
use serde_json::Value;

use crate::smarthome::{require_items, require_text, SmartHome, Slots};
use crate::utils::errors::{GatewayError, Result};

pub const AUTOMATION_OK: &str = "Automation configuration successful";

/// A scheduled device control task.
#[derive(Debug, Clone, Default)]
pub struct AutomationRequest {
    pub scheduled_time: String,
    pub devices: Vec<i64>,
    pub slots: Slots,
    pub task_name: String,
    pub execution_once: bool,
}

#[derive(Serialize)]
struct AutomationParams<'a> {
    scheduled_time: &'a str,
    devices: &'a [i64],
    slots: [&'a Slots; 1],
    task_name: &'a str,
    execution_once: bool,
}

impl SmartHome {
    pub async fn automation_config(&self, req: &AutomationRequest) -> Result<()> {
        let scheduled_time = require_text(&req.scheduled_time, "Scheduled time cannot be empty")?;
        require_items(&req.devices, "Device list cannot be empty")?;
        if req.slots.is_empty() {
            return Err(GatewayError::validation("Control parameters cannot be empty"));
        }
        let task_name = require_text(&req.task_name, "Task name cannot be empty")?;

        let params = AutomationParams {
            scheduled_time,
            devices: &req.devices,
            slots: [&req.slots],
            task_name,
            execution_once: req.execution_once,
        };
        let _: Option<Value> = self.call("AutomationConfig", &params).await?;
        Ok(())
    }
}
