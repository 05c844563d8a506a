use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    /// An operation was invoked before the security directory was
    /// configured. Surfaced at the host boundary, never recovered here.
    #[error("security subsystem not initialised")]
    NotInitialized,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("malformed payload: {0}")]
    Format(String),

    /// Authenticated decryption failed. Carries no detail: a tampered
    /// payload and a wrong-key payload must be indistinguishable.
    #[error("payload authentication failed")]
    Authentication,

    #[error("crypto failure: {0}")]
    Crypto(String),
}

impl From<std::io::Error> for SecurityError {
    fn from(e: std::io::Error) -> Self {
        SecurityError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for SecurityError {
    fn from(e: serde_json::Error) -> Self {
        SecurityError::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SecurityError>;
