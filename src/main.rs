//! stash_users CLI application
//!
//! Reports inactive Bitbucket users and deactivates the ones that never
//! logged in.

use std::process;

use clap::CommandFactory;

use stash_users::auth::TerminalPrompter;
use stash_users::cli::{handle_run, load_run_config, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    if std::env::args_os().len() <= 1 {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        println!();
        return;
    }

    let cli = Cli::parse_args();

    let config = match load_run_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run `stash_users --help` for usage.");
            process::exit(1);
        }
    };

    if let Err(e) = handle_run(&config, &mut TerminalPrompter).await {
        if e.is_configuration() {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}
