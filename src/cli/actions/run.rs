use crate::cli::{
    actions::{Action, account, navigate, session},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args, globals).await,
        Action::Logout => {
            session::logout(globals);
            Ok(())
        }
        Action::Whoami => {
            session::whoami(globals);
            Ok(())
        }
        Action::Navigate { path } => {
            navigate::navigate(&path, globals).await;
            Ok(())
        }
        Action::Fetch { path } => navigate::fetch(&path, globals).await,
        Action::Register(args) => account::register(args, globals).await,
        Action::Recover(args) => account::recover(args, globals).await,
    }
}
