use clap::{Arg, ArgAction, Command};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_SESSION_FILE: &str = "session-file";
pub const ARG_TIMEOUT: &str = "timeout";
pub const ARG_LOGIN_TIMEOUT: &str = "login-timeout";
pub const ARG_SHIP_LOGS: &str = "ship-logs";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("HRMS backend base URL")
                .env("HRMS_API_URL")
                .global(true)
                .default_value(crate::config::DEFAULT_API_BASE_URL),
        )
        .arg(
            Arg::new(ARG_SESSION_FILE)
                .long(ARG_SESSION_FILE)
                .help("Where the session is persisted (default: ~/.hrms-portal/session.json)")
                .env("HRMS_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long(ARG_TIMEOUT)
                .help("Per-request timeout in seconds")
                .env("HRMS_TIMEOUT")
                .global(true)
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_LOGIN_TIMEOUT)
                .long(ARG_LOGIN_TIMEOUT)
                .help("Upper bound for a login round trip in seconds")
                .env("HRMS_LOGIN_TIMEOUT")
                .global(true)
                .default_value("15")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new(ARG_SHIP_LOGS)
                .long(ARG_SHIP_LOGS)
                .help("Send client errors to the backend log collector")
                .env("HRMS_SHIP_LOGS")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}
