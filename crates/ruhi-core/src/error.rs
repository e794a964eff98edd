//! Error types for the Ruhi protection layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("Missing required configuration value: {0}")]
    ConfigMissing(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    // Licensing errors
    #[error("Invalid license format")]
    InvalidLicenseFormat,

    // Host capability errors
    #[error("Capability {capability} unavailable: {message}")]
    Capability {
        capability: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    // Infrastructure errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a host capability failure.
    pub fn capability(capability: &'static str, message: impl Into<String>) -> Self {
        Error::Capability {
            capability,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
