//! Command handler for the stash_users CLI
//!
//! Coordinates configuration, log setup, credential resolution and the
//! session. Configuration problems surface before the log file exists;
//! everything after that is written to the log.

use chrono::Utc;
use tracing::{error, info};

use crate::app::{run_session, SessionSummary};
use crate::auth::{resolve_credentials, Prompter};
use crate::cli::Cli;
use crate::config::{AppConfig, RunConfig};
use crate::errors::Result;
use crate::logging;

/// Build the run configuration from the command line and the config file
pub async fn load_run_config(cli: &Cli) -> Result<RunConfig> {
    let file = AppConfig::load(cli.config.as_deref()).await?;
    Ok(RunConfig::from_sources(cli, file)?)
}

/// Handle a full run
///
/// Opens the log file, prints where it lives on the way out, and reports
/// fatal errors through the log rather than the console.
pub async fn handle_run<P: Prompter>(config: &RunConfig, prompter: &mut P) -> Result<()> {
    let log_path = logging::init(&config.log_dir, config.simulation, config.verbose)?;

    let result = execute(config, prompter).await;
    if let Err(e) = &result {
        error!("{} ({})", e, e.category());
        println!("An error ocurred, check the logs for more info");
    }

    println!("Logs available at: {}", log_path.display());
    result.map(|_| ())
}

async fn execute<P: Prompter>(config: &RunConfig, prompter: &mut P) -> Result<SessionSummary> {
    if config.simulation {
        println!(" << Simulation mode ON >>");
    }
    info!(
        "stash_users v{} against {} (mode: {:?})",
        env!("CARGO_PKG_VERSION"),
        config.directory_host,
        config.mode
    );

    let credentials = resolve_credentials(&config.credentials, prompter)?;
    info!(
        "Resolved {} distinct API token(s)",
        credentials.distinct_tokens()
    );

    run_session(config, &credentials, Utc::now()).await
}
