use crate::{
    api::{self, Limits},
    cli::globals::GlobalArgs,
};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: SecretString,
    pub limits: Limits,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let globals = GlobalArgs::new(args.dsn);

    // SecretString keeps the DSN credentials out of this line.
    debug!("Global args: {:?}", globals);

    info!(
        port = args.port,
        rate_limit = args.limits.rate_limit,
        rate_window_secs = args.limits.rate_window_secs,
        max_login_attempts = args.limits.max_login_attempts,
        lockout_secs = args.limits.lockout_secs,
        "Starting server"
    );

    api::new(
        args.port,
        globals.dsn.expose_secret().to_string(),
        args.limits,
    )
    .await
}
