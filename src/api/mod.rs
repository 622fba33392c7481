//! HTTP helpers for the HRMS REST backend with a consistent timeout and error
//! policy. Feature clients build on these helpers instead of configuring
//! requests themselves. Bearer tokens are attached only when a caller passes
//! one, and are never logged.

pub mod auth;
mod errors;

pub use errors::ApiError;

use crate::APP_USER_AGENT;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of error message characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;
/// Stands in for the server's explanation when the error body carries none.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed.";

/// JSON client bound to one backend base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    /// Posts JSON without credentials and parses a JSON response.
    ///
    /// # Errors
    /// Returns an error on network failure, timeout, non-2xx status or an
    /// undecodable body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_json_authorized(path, body, None).await
    }

    /// Posts JSON, attaching `Authorization: Bearer` when a token is given.
    ///
    /// # Errors
    /// Same as [`ApiClient::post_json`].
    #[instrument(skip(self, body, token))]
    pub async fn post_json_authorized<B, T>(
        &self,
        path: &str,
        body: &B,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = with_bearer(self.http.post(self.url(path)).json(body), token);
        let response = request.send().await.map_err(map_request_error)?;

        handle_json_response(response).await
    }

    /// Posts JSON and ignores the response body.
    ///
    /// # Errors
    /// Returns an error on network failure, timeout or non-2xx status.
    #[instrument(skip(self, body))]
    pub async fn post_json_empty<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(map_request_error)?;

        handle_empty_response(response).await
    }

    /// Fetches JSON, attaching `Authorization: Bearer` when a token is given.
    /// Without a token the request goes out unauthenticated and the backend is
    /// expected to reject it.
    ///
    /// # Errors
    /// Same as [`ApiClient::post_json`].
    #[instrument(skip(self, token))]
    pub async fn get_json_authorized<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&SecretString>,
    ) -> Result<T, ApiError> {
        let request = with_bearer(self.http.get(self.url(path)), token);
        let response = request.send().await.map_err(map_request_error)?;

        handle_json_response(response).await
    }
}

fn with_bearer(builder: RequestBuilder, token: Option<&SecretString>) -> RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token.expose_secret()),
        None => {
            debug!("sending request without bearer token");
            builder
        }
    }
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ApiError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ApiError::Parse(format!("Failed to read response: {err}")))?;

    if status.is_success() {
        serde_json::from_str(&body).map_err(|err| {
            warn!(body = %truncate(body.trim()), "undecodable response body");
            ApiError::Parse(format!("Failed to decode response: {err}"))
        })
    } else {
        Err(ApiError::Http {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

async fn handle_empty_response(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Http {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// The backend's `{"message": ...}` field, or a generic message. Bodies
/// without one (proxy pages, stack traces) are only logged.
pub(crate) fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(truncate)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if !trimmed.is_empty() {
            debug!(body = %truncate(trimmed), "error response without a message");
        }
        REQUEST_FAILED_MESSAGE.to_string()
    })
}

fn truncate(message: &str) -> String {
    message.chars().take(MAX_ERROR_CHARS).collect()
}
