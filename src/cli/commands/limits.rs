use clap::Arg;

use crate::api::Limits;

pub const DEFAULT_RATE_LIMIT: u32 = 60;
pub const DEFAULT_RATE_WINDOW_SECS: u64 = 60;
pub const DEFAULT_MAX_LOGIN_ATTEMPTS: u32 = 5;
pub const DEFAULT_LOCKOUT_SECS: u64 = 1800;

pub fn args() -> Vec<Arg> {
    vec![
        Arg::new("rate-limit")
            .long("rate-limit")
            .help("Requests allowed per client and path within one window")
            .default_value("60")
            .env("CUSTOS_RATE_LIMIT")
            .value_parser(clap::value_parser!(u32)),
        Arg::new("rate-window-seconds")
            .long("rate-window-seconds")
            .help("Length of the rate limiting window in seconds")
            .default_value("60")
            .env("CUSTOS_RATE_WINDOW_SECONDS")
            .value_parser(clap::value_parser!(u64)),
        Arg::new("max-login-attempts")
            .long("max-login-attempts")
            .help("Failed logins tolerated per username before lockout")
            .default_value("5")
            .env("CUSTOS_MAX_LOGIN_ATTEMPTS")
            .value_parser(clap::value_parser!(u32)),
        Arg::new("lockout-seconds")
            .long("lockout-seconds")
            .help("Lockout window after too many failed logins, in seconds")
            .default_value("1800")
            .env("CUSTOS_LOCKOUT_SECONDS")
            .value_parser(clap::value_parser!(u64)),
    ]
}

#[must_use]
pub fn parse(matches: &clap::ArgMatches) -> Limits {
    Limits {
        rate_limit: matches
            .get_one::<u32>("rate-limit")
            .copied()
            .unwrap_or(DEFAULT_RATE_LIMIT),
        rate_window_secs: matches
            .get_one::<u64>("rate-window-seconds")
            .copied()
            .unwrap_or(DEFAULT_RATE_WINDOW_SECS),
        max_login_attempts: matches
            .get_one::<u32>("max-login-attempts")
            .copied()
            .unwrap_or(DEFAULT_MAX_LOGIN_ATTEMPTS),
        lockout_secs: matches
            .get_one::<u64>("lockout-seconds")
            .copied()
            .unwrap_or(DEFAULT_LOCKOUT_SECS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Command;

    fn command() -> Command {
        let mut command = Command::new("custos");
        for arg in args() {
            command = command.arg(arg);
        }
        command
    }

    #[test]
    fn test_limit_defaults() {
        temp_env::with_vars(
            [
                ("CUSTOS_RATE_LIMIT", None::<String>),
                ("CUSTOS_RATE_WINDOW_SECONDS", None),
                ("CUSTOS_MAX_LOGIN_ATTEMPTS", None),
                ("CUSTOS_LOCKOUT_SECONDS", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["custos"]);
                let limits = parse(&matches);
                assert_eq!(limits.rate_limit, 60);
                assert_eq!(limits.rate_window_secs, 60);
                assert_eq!(limits.max_login_attempts, 5);
                assert_eq!(limits.lockout_secs, 1800);
            },
        );
    }

    #[test]
    fn test_limit_env_overrides() {
        temp_env::with_vars(
            [
                ("CUSTOS_RATE_LIMIT", Some("10")),
                ("CUSTOS_RATE_WINDOW_SECONDS", Some("30")),
                ("CUSTOS_MAX_LOGIN_ATTEMPTS", Some("3")),
                ("CUSTOS_LOCKOUT_SECONDS", Some("600")),
            ],
            || {
                let matches = command().get_matches_from(vec!["custos"]);
                let limits = parse(&matches);
                assert_eq!(limits.rate_limit, 10);
                assert_eq!(limits.rate_window_secs, 30);
                assert_eq!(limits.max_login_attempts, 3);
                assert_eq!(limits.lockout_secs, 600);
            },
        );
    }

    #[test]
    fn test_limit_flags() {
        temp_env::with_vars(
            [
                ("CUSTOS_RATE_LIMIT", None::<String>),
                ("CUSTOS_LOCKOUT_SECONDS", None),
            ],
            || {
                let matches = command().get_matches_from(vec![
                    "custos",
                    "--rate-limit",
                    "100",
                    "--lockout-seconds",
                    "60",
                ]);
                let limits = parse(&matches);
                assert_eq!(limits.rate_limit, 100);
                assert_eq!(limits.lockout_secs, 60);
            },
        );
    }
}
