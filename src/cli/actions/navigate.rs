use crate::{
    api::ApiError,
    cli::globals::GlobalArgs,
    guard::routes::{Navigation, RedirectReason, RouteTable},
};
use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tracing::debug;

/// One-line description of a navigation outcome.
#[must_use]
pub fn describe(navigation: &Navigation) -> String {
    match navigation {
        Navigation::Loading => "loading: session not restored yet".to_string(),
        Navigation::Render { path } => format!("render {path}"),
        Navigation::Redirect { to, reason } => match reason {
            RedirectReason::Login { from } => {
                format!("redirect {to} (login required, return to {from})")
            }
            RedirectReason::Forbidden => format!("redirect {to} (role not allowed)"),
            RedirectReason::Index => format!("redirect {to}"),
        },
        Navigation::NotFound { path } => format!("not found {path}"),
    }
}

/// Prints how the portal would handle a visit to `path` with the persisted session.
pub async fn navigate(path: &str, globals: &GlobalArgs) {
    let session = globals.session();
    let navigation = RouteTable::portal().navigate_when_ready(&session, path).await;

    debug!(?navigation, "navigation resolved");
    println!("{}", describe(&navigation));
}

/// GETs `path` with the session's bearer token and pretty-prints the JSON.
/// # Errors
/// Returns an error if the request fails or the output cannot be rendered.
pub async fn fetch(path: &str, globals: &GlobalArgs) -> Result<()> {
    let session = globals.session();
    let token = session.bearer_token();

    let body: Value = match globals.api().get_json_authorized(path, token.as_ref()).await {
        Ok(body) => body,
        Err(err) => {
            globals
                .log_shipper()
                .error("request failed", json!({ "path": path, "error": err.to_string() }))
                .await;
            return Err(fetch_error(&err, token.is_some()));
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&body).context("failed to render response")?
    );
    Ok(())
}

fn fetch_error(err: &ApiError, had_token: bool) -> anyhow::Error {
    match err.status() {
        Some(401 | 403) if !had_token => anyhow!("{err}; log in first"),
        Some(401) => anyhow!("{err}; the session may have expired, log in again"),
        _ => anyhow!("{err}"),
    }
}
