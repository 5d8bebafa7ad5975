//! Command-line argument parsing for stash_users
//!
//! Host and log directory are declared optional here and checked when the
//! run configuration is built, so a missing value exits with status 1 and a
//! plain message instead of clap's usage error.

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::app::DeactivationMode;
use crate::auth::{CredentialOptions, LoginFlags};

/// stash_users - find and deactivate Bitbucket users who never logged in
#[derive(Parser, Debug, Clone)]
#[command(
    name = "stash_users",
    version,
    about = "Report inactive Bitbucket users and deactivate the ones that never logged in",
    long_about = "Pages through the members of the stash-users group, classifies them by the time since \
their last authentication and deactivates the users that never authenticated through the Crowd \
user-management API. Simulation mode is on unless explicitly disabled."
)]
pub struct Cli {
    /// Base URL of the Bitbucket server
    #[arg(short = 'a', long = "api", value_name = "HOST")]
    pub api: Option<String>,

    /// Base URL of the Crowd server (defaults to --api)
    #[arg(long, value_name = "HOST")]
    pub crowd_api: Option<String>,

    /// Pre-encoded Basic token for Crowd (`Basic ` prefix optional)
    #[arg(short = 't', long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Bitbucket username [env: BITBUCKET_USERNAME]
    #[arg(long, value_name = "USER")]
    pub bitbucket_user: Option<String>,

    /// Bitbucket password [env: BITBUCKET_PASSWORD]
    #[arg(long, value_name = "PASSWORD")]
    pub bitbucket_password: Option<String>,

    /// Crowd username [env: CROWD_USERNAME]
    #[arg(long, value_name = "USER")]
    pub crowd_user: Option<String>,

    /// Crowd password [env: CROWD_PASSWORD]
    #[arg(long, value_name = "PASSWORD")]
    pub crowd_password: Option<String>,

    /// Use the Bitbucket credentials for Crowd as well
    #[arg(long)]
    pub shared_credentials: bool,

    /// File with `<Label> <user:password>` lines
    #[arg(short = 'c', long, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Directory for the daily log files
    #[arg(short = 'l', long = "log", value_name = "DIR")]
    pub log: Option<PathBuf>,

    /// Write trace lines and print the summary with usernames
    #[arg(short, long)]
    pub verbose: bool,

    /// Simulate the deactivation calls; pass `false` to really deactivate
    #[arg(
        short,
        long,
        value_name = "BOOL",
        action = ArgAction::Set,
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true"
    )]
    pub simulation: bool,

    /// Deactivation call to issue
    #[arg(long, value_enum, value_name = "MODE")]
    pub mode: Option<DeactivationMode>,

    /// Users requested per page
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Do not draw the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Credential inputs, with environment variables filling unset flags
    pub fn credential_options(&self) -> CredentialOptions {
        use crate::auth::Api;

        CredentialOptions {
            bitbucket: LoginFlags {
                username: self.bitbucket_user.clone(),
                password: self.bitbucket_password.clone(),
            }
            .with_env_fallback(Api::Bitbucket),
            crowd: LoginFlags {
                username: self.crowd_user.clone(),
                password: self.crowd_password.clone(),
            }
            .with_env_fallback(Api::Crowd),
            crowd_token: self.token.clone(),
            shared: self.shared_credentials,
            credentials_file: self.credentials.clone(),
        }
    }
}
