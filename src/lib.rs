//! yalla: an MCP gateway that exposes smart-home actions as tools and forwards
//! each call to the home cloud service as a signed JSON request.

pub mod gateway;
pub mod identity;
pub mod mcp;
pub mod rpc;
pub mod smarthome;
pub mod utils;

pub use gateway::{Gateway, GatewayConfig};
pub use identity::DeviceIdentity;
pub use rpc::{ServiceCaller, SignedRpcClient};
pub use smarthome::SmartHome;
pub use utils::errors::{GatewayError, Result};
