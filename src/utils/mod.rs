//! Utility module: errors, logging and metrics.

pub mod errors;
pub mod logging;
pub mod metrics;

pub use errors::{GatewayError, Result};
pub use logging::init_logging;
pub use metrics::{MetricsRegistry, METRICS};
