//! Error types for the Skein client SDK
//!
//! Every failure a command send can produce surfaces through these variants;
//! nothing is logged and swallowed internally.

/// Main error type for the Skein client.
#[derive(Debug, thiserror::Error)]
pub enum SkeinError {
    /// Invalid builder or command arguments, detected before anything is sent
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The client was disposed; no further commands are accepted
    #[error("Client already disposed")]
    ClientDisposed,

    /// The credential strategy failed; the call never reached the transport
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The cancellation token fired before the request was sent
    #[error("Request cancelled before send")]
    Cancelled,

    /// gRPC communication error, carries the transport status code
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::Status),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SkeinError {
    /// Status code of a transport-level failure, if this is one.
    pub fn status_code(&self) -> Option<tonic::Code> {
        match self {
            Self::Grpc(status) => Some(status.code()),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, SkeinError>;
