pub mod account;
pub mod navigate;
pub mod session;

// Internal "interpreter" for `Action`.
mod run;

use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::io::{self, BufRead, Write};

#[derive(Debug)]
pub enum Action {
    Login(session::LoginArgs),
    Logout,
    Whoami,
    Navigate { path: String },
    Fetch { path: String },
    Register(account::RegisterArgs),
    Recover(account::RecoverArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> Result<()> {
        run::execute(self, globals).await
    }
}

/// Prints `prompt` on stderr and reads one trimmed line from stdin.
pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{prompt}: ");
    io::stderr().flush().ok();

    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        bail!("no input for {prompt}");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Uses the provided secret or asks for it on stdin.
pub(crate) fn secret_or_prompt(value: Option<SecretString>, prompt: &str) -> Result<SecretString> {
    match value {
        Some(secret) => Ok(secret),
        None => prompt_line(prompt).map(SecretString::from),
    }
}
