//! Account flows outside the session: self-registration and password recovery.
//! Input is validated locally before any request leaves the client; the backend
//! still has the final say.

pub mod recovery;

use crate::api::{ApiError, auth::AuthClient};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{info, instrument};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const PASSWORD_SYMBOLS: &str = "@$!%*?&";

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.\S+$").ok());

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Username is required.")]
    MissingUsername,
    #[error("Email is required.")]
    MissingEmail,
    #[error("Invalid email format.")]
    InvalidEmail,
    #[error("Password is required.")]
    MissingPassword,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Password must contain at least one lowercase letter.")]
    PasswordMissingLowercase,
    #[error("Password must contain at least one uppercase letter.")]
    PasswordMissingUppercase,
    #[error("Password must contain at least one number.")]
    PasswordMissingDigit,
    #[error("Password must contain at least one symbol (@$!%*?&).")]
    PasswordMissingSymbol,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("OTP is required.")]
    MissingOtp,
    #[error("OTP must be a number.")]
    OtpNotNumeric,
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// # Errors
/// Returns an error if the username is blank.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        Err(ValidationError::MissingUsername)
    } else {
        Ok(())
    }
}

/// # Errors
/// Returns an error if the email is blank or malformed.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    match EMAIL.as_ref() {
        Some(re) if re.is_match(email) => Ok(()),
        _ => Err(ValidationError::InvalidEmail),
    }
}

/// Checks the password strength rules, reporting the first one violated.
///
/// # Errors
/// Returns the first rule the password fails.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.trim().is_empty() {
        return Err(ValidationError::MissingPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ValidationError::PasswordMissingLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::PasswordMissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::PasswordMissingDigit);
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(ValidationError::PasswordMissingSymbol);
    }
    Ok(())
}

/// Validates a new password and its confirmation.
///
/// # Errors
/// Returns the first rule violated, or a mismatch.
pub fn validate_new_password(
    password: &SecretString,
    confirmation: &SecretString,
) -> Result<(), ValidationError> {
    validate_password(password.expose_secret())?;
    if password.expose_secret() != confirmation.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Validates and submits a self-registration. Returns the backend's message.
///
/// # Errors
/// Returns a validation error before any request, or the backend's rejection.
#[instrument(skip(client, password, confirmation))]
pub async fn register(
    client: &AuthClient,
    username: &str,
    password: &SecretString,
    confirmation: &SecretString,
) -> Result<String, AccountError> {
    validate_username(username)?;
    validate_new_password(password, confirmation)?;

    let response = client.register(username.trim(), password).await?;
    info!(username = username.trim(), "account registered, awaiting approval");
    Ok(response.message)
}
