use super::{principal::PrincipalError, storage::StorageError};
use crate::api::{ApiError, REQUEST_FAILED_MESSAGE};
use std::time::Duration;
use thiserror::Error;

/// Generic message used when the backend gives no usable explanation.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed due to an unexpected error.";

/// A failed `login`. Always surfaced to the caller; never recovered silently.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("login did not complete within {0:?}")]
    Timeout(Duration),
    #[error("malformed login response: {0}")]
    MalformedResponse(#[from] PrincipalError),
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
    #[error("a login is already in progress")]
    LoginInProgress,
    #[error("Access Denied: You are not authorized as an Admin.")]
    NotAdmin,
}

impl AuthError {
    /// Message fit for an inline error or toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Http { message, .. })
                if !message.trim().is_empty() && message != REQUEST_FAILED_MESSAGE =>
            {
                message.clone()
            }
            Self::Api(ApiError::Http { .. } | ApiError::Parse(_))
            | Self::MalformedResponse(_)
            | Self::Storage(_) => LOGIN_FAILED_MESSAGE.to_string(),
            Self::Api(err) => err.user_message().to_string(),
            Self::Timeout(_) => "Login timed out. Please try again.".to_string(),
            Self::LoginInProgress => "A login is already in progress.".to_string(),
            Self::NotAdmin => self.to_string(),
        }
    }
}

/// Why a persisted session could not be restored. Only ever logged.
#[derive(Debug, Error)]
pub enum HydrationError {
    #[error("session slot unreadable: {0}")]
    Storage(#[from] StorageError),
    #[error("session slot corrupt: {0}")]
    Corrupt(#[from] PrincipalError),
}
