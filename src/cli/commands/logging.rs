use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_LOG_JSON: &str = "log-json";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("HRMS_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(validator_log_level()),
        )
        .arg(
            Arg::new(ARG_LOG_JSON)
                .long("log-json")
                .help("Emit logs as JSON lines")
                .env("HRMS_LOG_JSON")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("test"))
    }

    #[test]
    fn test_log_level_names_and_numbers() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, level) in levels.iter().enumerate() {
            temp_env::with_var("HRMS_LOG_LEVEL", Some(level), || {
                let matches = command().get_matches_from(vec!["test"]);
                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
        temp_env::with_var("HRMS_LOG_LEVEL", Some("3"), || {
            let matches = command().get_matches_from(vec!["test"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn test_log_level_rejects_garbage() {
        temp_env::with_var("HRMS_LOG_LEVEL", Some("loud"), || {
            assert!(command().try_get_matches_from(vec!["test"]).is_err());
        });
    }

    #[test]
    fn test_verbosity_count() {
        temp_env::with_var("HRMS_LOG_LEVEL", None::<&str>, || {
            let matches = command().get_matches_from(vec!["test", "-vvv"]);
            assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(3));
        });
    }

    #[test]
    fn test_log_json_flag() {
        temp_env::with_var("HRMS_LOG_JSON", Some("true"), || {
            let matches = command().get_matches_from(vec!["test"]);
            assert!(matches.get_flag(ARG_LOG_JSON));
        });
        temp_env::with_var("HRMS_LOG_JSON", None::<&str>, || {
            let matches = command().get_matches_from(vec!["test"]);
            assert!(!matches.get_flag(ARG_LOG_JSON));
        });
    }
}
