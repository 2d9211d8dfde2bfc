use clap::{Arg, builder::ValueParser};

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

pub fn verbosity() -> Arg {
    Arg::new("verbosity")
        .short('v')
        .long("verbose")
        .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
        .env("CUSTOS_LOG_LEVEL")
        .global(true)
        .action(clap::ArgAction::Count)
        .value_parser(validator_log_level())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    #[test]
    fn test_log_level_names() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, level) in levels.iter().enumerate() {
            temp_env::with_vars([("CUSTOS_LOG_LEVEL", Some(level))], || {
                let command = Command::new("custos").arg(verbosity());
                let matches = command.get_matches_from(vec!["custos"]);
                assert_eq!(
                    matches.get_one::<u8>("verbosity").copied(),
                    Some(index as u8)
                );
            });
        }
    }

    #[test]
    fn test_log_level_flags() {
        temp_env::with_vars([("CUSTOS_LOG_LEVEL", None::<String>)], || {
            let command = Command::new("custos").arg(verbosity());
            let matches = command.get_matches_from(vec!["custos", "-vvv"]);
            assert_eq!(matches.get_one::<u8>("verbosity").copied(), Some(3));
        });
    }

    #[test]
    fn test_log_level_rejects_unknown() {
        temp_env::with_vars([("CUSTOS_LOG_LEVEL", Some("loud"))], || {
            let command = Command::new("custos").arg(verbosity());
            let result = command.try_get_matches_from(vec!["custos"]);
            assert!(result.is_err());
        });
    }
}
