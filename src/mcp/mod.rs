//! MCP front end: JSON-RPC over HTTP, bearer auth, CORS and the tool catalog.

pub mod auth;
pub mod cors;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::{build_router, AppState, McpServer};
pub use tools::{ToolError, ToolSet};
