//! Client for the backend's `/api/auth` endpoints. Login goes through the
//! [`Authenticator`] trait so the session store stays transport-agnostic;
//! registration and password recovery are plain calls used by the account
//! flows. Request bodies carry passwords and must never be logged.

use super::{ApiClient, ApiError};
use crate::session::{AuthError, Authenticator, Principal};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

pub const AUTH_BASE_PATH: &str = "/api/auth";

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    username: &'a str,
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    username: &'a str,
    new_password: &'a str,
}

/// Plain `{"message": ...}` acknowledgement.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

/// Reply to the first password recovery step. The backend echoes the issued
/// one-time code so the client can check it locally.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct OtpResponse {
    pub message: String,
    pub otp: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    fn path(endpoint: &str) -> String {
        format!("{AUTH_BASE_PATH}/{endpoint}")
    }

    /// Registers a new account. Accounts start as `PENDING` until an admin
    /// approves them.
    ///
    /// # Errors
    /// Returns an error if the backend rejects the registration or cannot be reached.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<MessageResponse, ApiError> {
        let body = CredentialsRequest {
            username,
            password: password.expose_secret(),
        };
        let response: MessageResponse = self.api.post_json(&Self::path("register"), &body).await?;
        info!("registration accepted");
        Ok(response)
    }

    /// First password recovery step: checks that `username` owns `email` and
    /// asks the backend to issue a one-time code.
    ///
    /// # Errors
    /// Returns an error if the pair does not match a user or the backend fails.
    #[instrument(skip(self, email))]
    pub async fn request_password_otp(
        &self,
        username: &str,
        email: &str,
    ) -> Result<OtpResponse, ApiError> {
        let body = ForgotPasswordRequest { username, email };
        self.api
            .post_json(&Self::path("verify-forgotpass-user"), &body)
            .await
    }

    /// # Errors
    /// Returns an error if the backend refuses the reset or cannot be reached.
    #[instrument(skip(self, new_password))]
    pub async fn reset_password(
        &self,
        username: &str,
        new_password: &SecretString,
    ) -> Result<MessageResponse, ApiError> {
        let body = ResetPasswordRequest {
            username,
            new_password: new_password.expose_secret(),
        };
        self.api
            .post_json(&Self::path("reset-password"), &body)
            .await
    }
}

#[async_trait]
impl Authenticator for AuthClient {
    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        let body = CredentialsRequest {
            username,
            password: password.expose_secret(),
        };

        let raw: serde_json::Value = self
            .api
            .post_json(&Self::path("login"), &body)
            .await
            .inspect_err(|err| warn!("login request failed: {err}"))?;

        let principal = Principal::from_json(&raw.to_string())?;
        Ok(principal)
    }
}
