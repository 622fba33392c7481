//! Runtime configuration for the portal client. Values come from CLI flags with
//! environment fallbacks; this module only normalizes and validates them.
//! Configuration values are not secret; credentials never pass through here.

use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const SESSION_FILE_NAME: &str = "session.json";
const CONFIG_DIR: &str = ".hrms-portal";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub request_timeout: Duration,
    pub login_timeout: Duration,
    pub ship_logs: bool,
    pub log_json: bool,
}

impl AppConfig {
    /// Builds a config, validating the base URL.
    ///
    /// # Errors
    /// Returns an error if `api_base_url` is blank or not an absolute http(s) URL.
    pub fn new(
        api_base_url: &str,
        session_file: Option<&Path>,
        request_timeout: Duration,
        login_timeout: Duration,
    ) -> Result<Self, String> {
        let api_base_url = normalize_base_url(api_base_url)
            .ok_or_else(|| format!("invalid API base URL: {api_base_url:?}"))?;

        Ok(Self {
            api_base_url,
            session_file: session_file.map_or_else(default_session_file, Path::to_path_buf),
            request_timeout,
            login_timeout,
            ship_logs: false,
            log_json: false,
        })
    }

    #[must_use]
    pub const fn with_ship_logs(mut self, ship_logs: bool) -> Self {
        self.ship_logs = ship_logs;
        self
    }

    #[must_use]
    pub const fn with_log_json(mut self, log_json: bool) -> Self {
        self.log_json = log_json;
        self
    }
}

/// Trims, drops trailing slashes and rejects anything that is not http(s).
#[must_use]
pub fn normalize_base_url(value: &str) -> Option<String> {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let url = Url::parse(trimmed).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return None;
    }

    Some(trimmed.to_string())
}

/// `$HOME/.hrms-portal/session.json`, or the working directory without a home.
#[must_use]
pub fn default_session_file() -> PathBuf {
    env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map_or_else(
            || PathBuf::from(CONFIG_DIR),
            |home| PathBuf::from(home).join(CONFIG_DIR),
        )
        .join(SESSION_FILE_NAME)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_trims_and_rejects_empty() {
        assert_eq!(normalize_base_url(""), None);
        assert_eq!(normalize_base_url("   "), None);
        assert_eq!(
            normalize_base_url("  https://hrms.example.com/ "),
            Some("https://hrms.example.com".to_string())
        );
        assert_eq!(
            normalize_base_url("http://127.0.0.1:8080"),
            Some("http://127.0.0.1:8080".to_string())
        );
    }

    #[test]
    fn normalize_base_url_rejects_other_schemes() {
        assert_eq!(normalize_base_url("ftp://hrms.example.com"), None);
        assert_eq!(normalize_base_url("hrms.example.com"), None);
        assert_eq!(normalize_base_url("file:///tmp"), None);
    }

    #[test]
    fn default_session_file_follows_home() {
        temp_env::with_var("HOME", Some("/home/alice"), || {
            assert_eq!(
                default_session_file(),
                PathBuf::from("/home/alice/.hrms-portal/session.json")
            );
        });
        temp_env::with_var("HOME", None::<&str>, || {
            assert_eq!(default_session_file(), PathBuf::from(".hrms-portal/session.json"));
        });
    }

    #[test]
    fn new_rejects_invalid_url() {
        let err = AppConfig::new(" ", None, Duration::from_secs(1), Duration::from_secs(1)).unwrap_err();
        assert!(err.contains("invalid API base URL"));
    }

    #[test]
    fn new_keeps_explicit_session_file() {
        let config = AppConfig::new(
            "https://hrms.example.com/",
            Some(Path::new("/tmp/s.json")),
            Duration::from_secs(5),
            Duration::from_secs(15),
        )
        .unwrap()
        .with_ship_logs(true);

        assert_eq!(config.api_base_url, "https://hrms.example.com");
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert!(config.ship_logs);
        assert!(!config.log_json);
    }
}
