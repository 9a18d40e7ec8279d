use thiserror::Error;

/// Message returned when the cloud service answers with something that is not a response envelope.
pub const INVALID_DATA_MESSAGE: &str =
    "The received data is not in a valid JSON format. Please try again later.";

/// Unified error type for the gateway.
///
/// The `Display` output of every variant is the text shown to the MCP client,
/// so variants never carry raw response bodies.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A required argument was missing or blank. Raised before any network call.
    #[error("{0}")]
    Validation(String),

    #[error("Data format error (invalid JSON data). Please try again later.")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to create HTTP request: {0}")]
    Request(String),

    #[error("An error occurred while requesting the cloud service. {0}")]
    Transport(String),

    #[error("Failed to read response: {0}")]
    ReadBody(String),

    #[error("API call failed. status code: {0}")]
    Status(u16),

    /// The body was not a response envelope. Carries the envelope's `message`
    /// when one could still be recovered from the body.
    #[error("{}", .0.as_deref().unwrap_or(INVALID_DATA_MESSAGE))]
    InvalidData(Option<String>),

    /// The cloud service answered with a non-zero code.
    #[error("{message}")]
    Remote { code: i64, message: String },

    /// The call succeeded but carried no result where one is required.
    #[error("{0}")]
    NoData(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        GatewayError::Validation(msg.into())
    }

    /// True for errors raised locally before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, GatewayError::Validation(_))
    }
}

/// Convenience alias
pub type Result<T> = std::result::Result<T, GatewayError>;
