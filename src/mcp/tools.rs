//! Tool catalog: declarations for `tools/list` and dispatch for `tools/call`.
//!
//! Every tool translates its arguments into one smart-home call and turns the
//! outcome into text. A failed call becomes an `isError` text result, never a
//! protocol error; only unknown tools and malformed arguments are rejected.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, info};

use crate::mcp::protocol::{CallToolResult, Tool};
use crate::smarthome::automation::{AutomationRequest, AUTOMATION_OK};
use crate::smarthome::devices::DEVICE_CONTROL_OK;
use crate::smarthome::scenes::SCENES_RUN;
use crate::smarthome::{SmartHome, Slots};
use crate::utils::errors::Result;
use crate::utils::metrics::{METRICS, TOOL_CALLS, TOOL_FAILURES};

pub const LIST_HOMES: &str = "list_homes";
pub const SWITCH_HOME: &str = "switch_home";
pub const LIST_BUTTONS: &str = "list_device_control_buttons";
pub const PUSH_BUTTON: &str = "push_device_control_button";
pub const QUERY_DEVICES: &str = "query_devices";
pub const QUERY_DEVICE_STATUS: &str = "query_device_status";
pub const CONTROL_DEVICES: &str = "control_devices";
pub const CONFIGURE_AUTOMATION: &str = "configure_automation";
pub const QUERY_DEVICE_LOGS: &str = "query_device_logs";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments for tool {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },
}

#[derive(Deserialize)]
struct SwitchHomeArgs {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct PushButtonArgs {
    button: i64,
}

#[derive(Deserialize, Default)]
struct DeviceFilterArgs {
    #[serde(default)]
    positions: Vec<String>,
    #[serde(default)]
    device_types: Vec<String>,
}

#[derive(Deserialize)]
struct ControlDevicesArgs {
    #[serde(default)]
    devices: Vec<i64>,
    #[serde(default)]
    slots: Slots,
}

#[derive(Deserialize)]
struct AutomationArgs {
    #[serde(default)]
    scheduled_time: String,
    #[serde(default)]
    devices: Vec<i64>,
    #[serde(default)]
    slots: Slots,
    #[serde(default)]
    task_name: String,
    #[serde(default)]
    execution_once: bool,
}

#[derive(Deserialize)]
struct DeviceLogArgs {
    #[serde(default)]
    devices: Vec<i64>,
    #[serde(default)]
    start_datetime: String,
    #[serde(default)]
    end_datetime: String,
    #[serde(default)]
    attributes: Vec<String>,
}

/// The tools exposed to MCP clients, bound to one smart-home API.
pub struct ToolSet {
    home: SmartHome,
    button_notes: String,
}

impl ToolSet {
    pub fn new(home: SmartHome, button_notes: impl Into<String>) -> Self {
        Self { home, button_notes: button_notes.into() }
    }

    pub fn definitions(&self) -> Vec<Tool> {
        let mut buttons_description = String::from(
            "Get all device control buttons under the user's home.\n\
             Returns:\n  Control buttons information in Markdown format",
        );
        if !self.button_notes.trim().is_empty() {
            buttons_description.push_str("\n\nNOTES:\n");
            buttons_description.push_str(self.button_notes.trim());
        }

        let device_filter = json!({
            "type": "object",
            "properties": {
                "positions": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "rooms or positions to include; empty for all"
                },
                "device_types": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "device types to include; empty for all"
                }
            }
        });
        let slots = json!({
            "type": "object",
            "description": "control parameters, e.g. {\"on_off\": 1}"
        });

        vec![
            tool(
                LIST_HOMES,
                "Get all homes under the user (useful when the user wants to query/switch homes).\n\
                 Returns:\nOne entry per home name; a message if no data.",
                json!({"type": "object", "properties": {}}),
            ),
            tool(
                SWITCH_HOME,
                "Switch the user's current home.\nReturns:\nSwitch result message.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "name of the home to switch to"}
                    },
                    "required": ["name"]
                }),
            ),
            tool(LIST_BUTTONS, &buttons_description, json!({"type": "object", "properties": {}})),
            tool(
                PUSH_BUTTON,
                "Push device control buttons under the user's home, \
                 or control buttons in a specified room.\n\
                 Returns:\n  Device control button push result message.",
                json!({
                    "type": "object",
                    "properties": {
                        "button": {
                            "type": "integer",
                            "description":
                                "the control button to push, exactly one button should be provided"
                        }
                    },
                    "required": ["button"]
                }),
            ),
            tool(
                QUERY_DEVICES,
                "List devices in the user's home, optionally filtered by position and device type.",
                device_filter.clone(),
            ),
            tool(
                QUERY_DEVICE_STATUS,
                "Get the current status of devices, \
                 optionally filtered by position and device type.",
                device_filter,
            ),
            tool(
                CONTROL_DEVICES,
                "Send one control command to one or more devices.",
                json!({
                    "type": "object",
                    "properties": {
                        "devices": {
                            "type": "array",
                            "items": {"type": "integer"},
                            "description": "device endpoint ids"
                        },
                        "slots": slots
                    },
                    "required": ["devices", "slots"]
                }),
            ),
            tool(
                CONFIGURE_AUTOMATION,
                "Schedule a device control task.",
                json!({
                    "type": "object",
                    "properties": {
                        "scheduled_time": {"type": "string", "description": "when to run the task"},
                        "devices": {"type": "array", "items": {"type": "integer"}},
                        "slots": slots,
                        "task_name": {"type": "string"},
                        "execution_once": {
                            "type": "boolean",
                            "description": "run once instead of repeating"
                        }
                    },
                    "required": ["scheduled_time", "devices", "slots", "task_name"]
                }),
            ),
            tool(
                QUERY_DEVICE_LOGS,
                "Query historical logs of devices.",
                json!({
                    "type": "object",
                    "properties": {
                        "devices": {"type": "array", "items": {"type": "integer"}},
                        "start_datetime": {"type": "string"},
                        "end_datetime": {"type": "string"},
                        "attributes": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["devices"]
                }),
            ),
        ]
    }

    /// Run tool `name`. Remote and validation failures come back as `isError` results.
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> std::result::Result<CallToolResult, ToolError> {
        METRICS.inc_counter(TOOL_CALLS);
        let result = self.dispatch(name, arguments.unwrap_or(Value::Null)).await?;
        if result.is_error {
            METRICS.inc_counter(TOOL_FAILURES);
            error!(tool = name, message = %result.text(), "tool call failed");
        } else {
            info!(tool = name, "tool call succeeded");
        }
        Ok(result)
    }

    async fn dispatch(
        &self,
        name: &str,
        args: Value,
    ) -> std::result::Result<CallToolResult, ToolError> {
        let home = &self.home;
        let result = match name {
            LIST_HOMES => match home.get_homes().await {
                Ok(homes) if homes.is_empty() => CallToolResult::success(["No homes found."]),
                Ok(homes) => CallToolResult::success(homes),
                Err(e) => failure(name, e.to_string()),
            },
            SWITCH_HOME => {
                let a: SwitchHomeArgs = parse_args(name, args)?;
                text_outcome(
                    name,
                    home.switch_home(&a.name)
                        .await
                        .map(|_| format!("Successfully switched to home \"{}\"", a.name.trim())),
                )
            }
            LIST_BUTTONS => text_outcome(
                name,
                home.get_scenes(&[])
                    .await
                    .map(|listing| listing.replace("scene", "device button")),
            ),
            PUSH_BUTTON => {
                let a: PushButtonArgs = parse_args(name, args)?;
                let outcome = home.run_scenes(&[a.button]).await;
                text_outcome(name, outcome.map(|_| SCENES_RUN.to_string()))
            }
            QUERY_DEVICES => {
                let a: DeviceFilterArgs = parse_args(name, args)?;
                text_outcome(name, home.device_query(&a.positions, &a.device_types).await)
            }
            QUERY_DEVICE_STATUS => {
                let a: DeviceFilterArgs = parse_args(name, args)?;
                text_outcome(name, home.device_status_query(&a.positions, &a.device_types).await)
            }
            CONTROL_DEVICES => {
                let a: ControlDevicesArgs = parse_args(name, args)?;
                text_outcome(
                    name,
                    home.device_control(&a.devices, &a.slots)
                        .await
                        .map(|_| DEVICE_CONTROL_OK.to_string()),
                )
            }
            CONFIGURE_AUTOMATION => {
                let a: AutomationArgs = parse_args(name, args)?;
                let req = AutomationRequest {
                    scheduled_time: a.scheduled_time,
                    devices: a.devices,
                    slots: a.slots,
                    task_name: a.task_name,
                    execution_once: a.execution_once,
                };
                text_outcome(
                    name,
                    home.automation_config(&req).await.map(|_| AUTOMATION_OK.to_string()),
                )
            }
            QUERY_DEVICE_LOGS => {
                let a: DeviceLogArgs = parse_args(name, args)?;
                let logs = home
                    .device_log_query(&a.devices, &a.start_datetime, &a.end_datetime, &a.attributes)
                    .await;
                text_outcome(name, logs)
            }
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(result)
    }
}

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Tools without parameters accept a missing or null argument object.
fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> std::result::Result<T, ToolError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn text_outcome(tool: &str, outcome: Result<String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success([text]),
        Err(e) => failure(tool, e.to_string()),
    }
}

fn failure(tool: &str, message: String) -> CallToolResult {
    if message.is_empty() {
        CallToolResult::failure(format!("{} failed due to an unknown error.", tool))
    } else {
        CallToolResult::failure(message)
    }
}
