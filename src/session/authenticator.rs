use super::{errors::AuthError, principal::Principal};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;

/// Exchanges credentials for a principal. The HTTP implementation lives in
/// [`crate::api::auth::AuthClient`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// # Errors
    /// Returns an error when the credentials are rejected or the exchange fails.
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError>;
}

#[async_trait]
impl<T: Authenticator + ?Sized> Authenticator for Arc<T> {
    async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Principal, AuthError> {
        (**self).authenticate(username, password).await
    }
}
