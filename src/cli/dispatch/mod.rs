//! Maps validated CLI matches to the shared configuration and the action to run.

use crate::{
    cli::{
        actions::{
            Action,
            account::{RecoverArgs, RegisterArgs},
            session::LoginArgs,
        },
        commands::{self, api, logging},
    },
    config::AppConfig,
};
use anyhow::{Context, Result, anyhow, bail};
use secrecy::SecretString;
use std::{path::Path, time::Duration};

/// Build the configuration from the global flags.
///
/// # Errors
/// Returns an error if the API URL is invalid.
pub fn config(matches: &clap::ArgMatches) -> Result<AppConfig> {
    let api_url = matches
        .get_one::<String>(api::ARG_API_URL)
        .context("missing required argument: --api-url")?;
    let session_file = matches.get_one::<String>(api::ARG_SESSION_FILE).map(Path::new);
    let seconds = |id: &str| matches.get_one::<u64>(id).copied().map(Duration::from_secs);

    let config = AppConfig::new(
        api_url,
        session_file,
        seconds(api::ARG_TIMEOUT).unwrap_or(crate::api::DEFAULT_TIMEOUT),
        seconds(api::ARG_LOGIN_TIMEOUT).unwrap_or(crate::session::DEFAULT_LOGIN_TIMEOUT),
    )
    .map_err(|e| anyhow!(e))?
    .with_ship_logs(matches.get_flag(api::ARG_SHIP_LOGS))
    .with_log_json(matches.get_flag(logging::ARG_LOG_JSON));

    Ok(config)
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if a required argument is missing or no subcommand was given.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let string = |m: &clap::ArgMatches, id: &str| m.get_one::<String>(id).cloned();
    let required = |m: &clap::ArgMatches, id: &str| {
        string(m, id).with_context(|| format!("missing required argument: --{id}"))
    };
    let secret = |m: &clap::ArgMatches, id: &str| string(m, id).map(SecretString::from);

    let action = match matches.subcommand() {
        Some((commands::CMD_LOGIN, sub)) => Action::Login(LoginArgs {
            username: required(sub, "username")?,
            password: secret(sub, "password"),
            from: string(sub, "from"),
            admin: sub.get_flag("admin"),
        }),
        Some((commands::CMD_LOGOUT, _)) => Action::Logout,
        Some((commands::CMD_WHOAMI, _)) => Action::Whoami,
        Some((commands::CMD_NAVIGATE, sub)) => Action::Navigate {
            path: required(sub, "path")?,
        },
        Some((commands::CMD_FETCH, sub)) => Action::Fetch {
            path: required(sub, "path")?,
        },
        Some((commands::CMD_REGISTER, sub)) => Action::Register(RegisterArgs {
            username: required(sub, "username")?,
            password: secret(sub, "password"),
        }),
        Some((commands::CMD_RECOVER, sub)) => Action::Recover(RecoverArgs {
            username: required(sub, "username")?,
            email: required(sub, "email")?,
            new_password: secret(sub, "new-password"),
        }),
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("missing command"),
    };

    Ok(action)
}
