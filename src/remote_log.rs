//! Ships client-side log entries to the backend's log collector. Shipping is
//! best-effort: a failure is reported locally and never reaches the caller.

use crate::{APP_USER_AGENT, api::ApiClient};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;
use tracing::{debug, warn};

pub const FRONTEND_LOGS_PATH: &str = "/api/frontend-logs";
/// Context key the collector reads the client identifier from.
pub const USER_AGENT_KEY: &str = "userAgent";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: &'static str,
    pub message: String,
    pub context: Value,
}

impl LogEntry {
    /// Builds an entry stamped now. Non-object contexts are wrapped under
    /// `"data"`; the user agent is added unless the caller set one.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>, context: Value) -> Self {
        let mut fields = match context {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        fields
            .entry(USER_AGENT_KEY)
            .or_insert_with(|| Value::String(APP_USER_AGENT.to_string()));

        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.as_str(),
            message: message.into(),
            context: Value::Object(fields),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogShipper {
    api: ApiClient,
    enabled: bool,
}

impl LogShipper {
    #[must_use]
    pub const fn new(api: ApiClient, enabled: bool) -> Self {
        Self { api, enabled }
    }

    #[must_use]
    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sends one entry. Returns whether the backend accepted it.
    pub async fn ship(&self, level: LogLevel, message: &str, context: Value) -> bool {
        if !self.enabled {
            debug!(level = %level, "log shipping disabled, dropping entry");
            return false;
        }

        let entry = LogEntry::new(level, message, context);
        match self.api.post_json_empty(FRONTEND_LOGS_PATH, &entry).await {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to ship log entry: {err}");
                false
            }
        }
    }

    pub async fn error(&self, message: &str, context: Value) -> bool {
        self.ship(LogLevel::Error, message, context).await
    }

    pub async fn warn(&self, message: &str, context: Value) -> bool {
        self.ship(LogLevel::Warn, message, context).await
    }

    pub async fn info(&self, message: &str) -> bool {
        self.ship(LogLevel::Info, message, json!({})).await
    }
}
