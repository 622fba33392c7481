pub mod api;
pub mod logging;

use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_NAVIGATE: &str = "navigate";
pub const CMD_FETCH: &str = "fetch";
pub const CMD_REGISTER: &str = "register";
pub const CMD_RECOVER: &str = "recover";

fn username_arg() -> Arg {
    Arg::new("username")
        .short('u')
        .long("username")
        .help("Account username")
        .env("HRMS_USERNAME")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .help("Account password; read from stdin when omitted")
        .env("HRMS_PASSWORD")
        .hide_env_values(true)
}

fn login_command() -> Command {
    Command::new(CMD_LOGIN)
        .about("Log in and persist the session")
        .arg(username_arg())
        .arg(password_arg())
        .arg(
            Arg::new("from")
                .long("from")
                .help("Page that asked for the login; used to pick the landing page"),
        )
        .arg(
            Arg::new("admin")
                .long("admin")
                .help("Administration console login; refuses any role but ADMIN")
                .action(ArgAction::SetTrue),
        )
}

fn navigate_command() -> Command {
    Command::new(CMD_NAVIGATE)
        .about("Evaluate a portal navigation for the current session")
        .arg(Arg::new("path").help("Portal path, e.g. /admin/payroll").required(true))
}

fn fetch_command() -> Command {
    Command::new(CMD_FETCH)
        .about("GET a backend endpoint with the session's bearer token")
        .arg(Arg::new("path").help("API path, e.g. /api/employees").required(true))
}

fn register_command() -> Command {
    Command::new(CMD_REGISTER)
        .about("Register a new account (starts pending admin approval)")
        .arg(username_arg())
        .arg(password_arg())
}

fn recover_command() -> Command {
    Command::new(CMD_RECOVER)
        .about("Reset a forgotten password with a one-time code")
        .arg(username_arg())
        .arg(
            Arg::new("email")
                .short('e')
                .long("email")
                .help("Email registered for the account")
                .env("HRMS_EMAIL")
                .required(true),
        )
        .arg(
            Arg::new("new-password")
                .long("new-password")
                .help("New password; read from stdin when omitted")
                .env("HRMS_NEW_PASSWORD")
                .hide_env_values(true),
        )
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("hrms-portal")
        .about("HRMS portal session client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(login_command())
        .subcommand(Command::new(CMD_LOGOUT).about("Clear the persisted session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the restored session"))
        .subcommand(navigate_command())
        .subcommand(fetch_command())
        .subcommand(register_command())
        .subcommand(recover_command());

    let command = api::with_args(command);
    logging::with_args(command)
}
