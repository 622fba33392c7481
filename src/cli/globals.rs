use crate::{
    api::{ApiClient, auth::AuthClient},
    config::AppConfig,
    remote_log::LogShipper,
    session::{FileStorage, SessionStore},
};
use anyhow::{Context, Result};

/// Session store as wired by the CLI: backend login, file-backed slot.
pub type PortalSession = SessionStore<AuthClient, FileStorage>;

/// Shared collaborators built once from the global flags.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub config: AppConfig,
    api: ApiClient,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: AppConfig) -> Result<Self> {
        let api = ApiClient::new(&config.api_base_url, config.request_timeout)
            .context("failed to set up the API client")?;
        Ok(Self { config, api })
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn auth_client(&self) -> AuthClient {
        AuthClient::new(self.api.clone())
    }

    #[must_use]
    pub fn log_shipper(&self) -> LogShipper {
        LogShipper::new(self.api.clone(), self.config.ship_logs)
    }

    /// A fresh store over the configured session file, hydrated and ready.
    #[must_use]
    pub fn session(&self) -> PortalSession {
        let store = SessionStore::new(
            self.auth_client(),
            FileStorage::new(&self.config.session_file),
        )
        .with_login_timeout(self.config.login_timeout);
        store.hydrate();
        store
    }
}
