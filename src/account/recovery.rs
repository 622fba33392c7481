//! Forgot-password flow. Three backend-visible steps in a fixed order:
//! verify the username/email pair (the backend issues a one-time code),
//! check the code the user typed, then set a new password.

use super::{ValidationError, validate_email, validate_new_password, validate_username};
use crate::api::{ApiError, auth::AuthClient};
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    VerifyUser,
    VerifyOtp { expected: u32 },
    ResetPassword,
    Complete,
}

impl Step {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VerifyUser => "verify-user",
            Self::VerifyOtp { .. } => "verify-otp",
            Self::ResetPassword => "reset-password",
            Self::Complete => "complete",
        }
    }
}

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("Cannot {action} during the {step} step.")]
    WrongStep { action: &'static str, step: &'static str },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("User not registered. Please register first.")]
    NotRegistered,
    #[error("Server did not issue an OTP.")]
    MissingOtp,
    #[error("Invalid OTP.")]
    InvalidOtp,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// State of one password recovery attempt.
#[derive(Debug)]
pub struct PasswordRecovery {
    username: String,
    step: Step,
}

impl Default for PasswordRecovery {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordRecovery {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            username: String::new(),
            step: Step::VerifyUser,
        }
    }

    #[must_use]
    pub const fn step(&self) -> &Step {
        &self.step
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Verifies the username/email pair and moves to the OTP step.
    ///
    /// # Errors
    /// Returns an error on invalid input, an unknown user, or when the backend
    /// does not hand back a code.
    #[instrument(skip(self, client, email))]
    pub async fn request_otp(
        &mut self,
        client: &AuthClient,
        username: &str,
        email: &str,
    ) -> Result<String, RecoveryError> {
        self.ensure_step(&Step::VerifyUser, "request an OTP")?;
        validate_username(username)?;
        validate_email(email)?;

        let username = username.trim();
        let response = client
            .request_password_otp(username, email.trim())
            .await
            .map_err(not_registered)?;
        let expected = response.otp.ok_or(RecoveryError::MissingOtp)?;

        username.clone_into(&mut self.username);
        self.step = Step::VerifyOtp { expected };
        info!(username, "password recovery code issued");
        Ok(response.message)
    }

    /// Checks the code the user typed. A mismatch keeps the flow on this step.
    ///
    /// # Errors
    /// Returns an error when the input is empty, not numeric, or wrong.
    pub fn verify_otp(&mut self, input: &str) -> Result<(), RecoveryError> {
        let Step::VerifyOtp { expected } = self.step else {
            return Err(self.wrong_step("verify an OTP"));
        };

        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::MissingOtp.into());
        }
        let entered: u32 = input.parse().map_err(|_| ValidationError::OtpNotNumeric)?;

        if entered != expected {
            warn!(username = %self.username, "password recovery code mismatch");
            return Err(RecoveryError::InvalidOtp);
        }

        self.step = Step::ResetPassword;
        Ok(())
    }

    /// Sets the new password and completes the flow.
    ///
    /// # Errors
    /// Returns an error on a weak or mismatched password, or when the backend
    /// refuses the reset.
    #[instrument(skip_all, fields(username = %self.username))]
    pub async fn reset_password(
        &mut self,
        client: &AuthClient,
        password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<String, RecoveryError> {
        self.ensure_step(&Step::ResetPassword, "reset the password")?;
        validate_new_password(password, confirmation)?;

        let response = client.reset_password(&self.username, password).await?;
        self.step = Step::Complete;
        info!("password reset");
        Ok(response.message)
    }

    fn ensure_step(&self, step: &Step, action: &'static str) -> Result<(), RecoveryError> {
        if &self.step == step {
            Ok(())
        } else {
            Err(self.wrong_step(action))
        }
    }

    const fn wrong_step(&self, action: &'static str) -> RecoveryError {
        RecoveryError::WrongStep {
            action,
            step: self.step.name(),
        }
    }
}

fn not_registered(err: ApiError) -> RecoveryError {
    if err.user_message().to_lowercase().contains("register") {
        RecoveryError::NotRegistered
    } else {
        RecoveryError::Api(err)
    }
}
