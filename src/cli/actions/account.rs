use crate::{
    account::{
        self,
        recovery::{PasswordRecovery, RecoveryError},
    },
    cli::{
        actions::{prompt_line, secret_or_prompt},
        globals::GlobalArgs,
    },
};
use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};

/// Wrong codes allowed before the recovery gives up.
const MAX_OTP_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub struct RegisterArgs {
    pub username: String,
    pub password: Option<SecretString>,
}

#[derive(Debug)]
pub struct RecoverArgs {
    pub username: String,
    pub email: String,
    pub new_password: Option<SecretString>,
}

/// A password given on the command line confirms itself; otherwise both are
/// read from stdin.
fn password_pair(value: Option<SecretString>, prompt: &str) -> Result<(SecretString, SecretString)> {
    match value {
        Some(password) => {
            let confirmation = SecretString::from(password.expose_secret().to_string());
            Ok((password, confirmation))
        }
        None => Ok((
            secret_or_prompt(None, prompt)?,
            secret_or_prompt(None, &format!("Confirm {}", prompt.to_lowercase()))?,
        )),
    }
}

/// # Errors
/// Returns an error if validation fails or the backend rejects the account.
pub async fn register(args: RegisterArgs, globals: &GlobalArgs) -> Result<()> {
    let (password, confirmation) = password_pair(args.password, "Password")?;

    let message =
        account::register(&globals.auth_client(), &args.username, &password, &confirmation).await?;
    println!("{message}");
    Ok(())
}

/// Walks the three recovery steps, asking for the emailed code on stdin.
/// # Errors
/// Returns an error if any step fails or the code is wrong too many times.
pub async fn recover(args: RecoverArgs, globals: &GlobalArgs) -> Result<()> {
    let client = globals.auth_client();
    let mut flow = PasswordRecovery::new();

    let message = flow.request_otp(&client, &args.username, &args.email).await?;
    println!("{message}");

    let mut attempts = 0;
    loop {
        let code = prompt_line("One-time code")?;
        match flow.verify_otp(&code) {
            Ok(()) => break,
            Err(err @ (RecoveryError::InvalidOtp | RecoveryError::Validation(_))) => {
                attempts += 1;
                if attempts >= MAX_OTP_ATTEMPTS {
                    return Err(anyhow!("{err} Giving up after {MAX_OTP_ATTEMPTS} attempts."));
                }
                eprintln!("{err}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let (password, confirmation) = password_pair(args.new_password, "New password")?;

    let message = flow.reset_password(&client, &password, &confirmation).await?;
    println!("{message}");
    Ok(())
}
