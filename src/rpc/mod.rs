//! Signed RPC client for the home cloud API.
//!
//! - `envelope`: request/response bodies and reply classification
//! - `signing`: HMAC-SHA256 request signatures and nonce/timestamp headers
//! - `client`: `SignedRpcClient`, one signed POST per call, no retries
//!
//! Every failure surfaces as a `GatewayError` whose message is safe to show
//! to the end user.

pub mod client;
pub mod envelope;
pub mod signing;

pub use client::{ServiceCaller, SignedRpcClient, DEFAULT_API_TIMEOUT};
pub use envelope::{RequestEnvelope, ResponseEnvelope, PROTOCOL_VERSION};
pub use signing::{calculate_signature, SignatureHeaders};
