//! Error types for the Garoon provider.

use calmap_core::{CoreError, Instant};
use thiserror::Error;

/// Errors that can occur while talking to a Garoon server.
#[derive(Error, Debug)]
pub enum GaroonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered, but the body is not what a Garoon server
    /// produces (malformed XML, WSDL without endpoints, ...).
    #[error("failed to parse server response: {0}")]
    ResponseParse(String),

    /// The server reported a SOAP fault.
    #[error("SOAP fault {code}: {reason}")]
    SoapFault { code: String, reason: String },

    /// The requested service is not published by the server, even
    /// after re-fetching the WSDL.
    #[error("service {0:?} is not published by the server")]
    UnknownService(String),

    #[error("invalid retrieval range (start: {start}, end: {end})")]
    InvalidRange { start: Instant, end: Instant },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Garoon operations.
pub type GaroonResult<T> = Result<T, GaroonError>;
