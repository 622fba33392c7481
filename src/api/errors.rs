use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
}

impl ApiError {
    /// The part of the error meant for a person: the server's own message for
    /// HTTP failures, the description otherwise.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Config(message)
            | Self::Network(message)
            | Self::Timeout(message)
            | Self::Parse(message)
            | Self::Serialization(message)
            | Self::Http { message, .. } => message,
        }
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
