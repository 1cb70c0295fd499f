//! Client error types for hosted backend communication.

/// Error type for account and records service operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// The service answered and refused the request (bad credentials,
    /// duplicate email, row-level security, ...). The message is meant for
    /// the user and is shown verbatim.
    #[error("{0}")]
    Rejected(String),
    /// Service is not configured.
    #[error("Service not configured: {0}")]
    NotConfigured(&'static str),
    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),
    /// The response could not be decoded into the expected shape.
    #[error("Decoding failed: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
