//! Credential handling for the Bitbucket and Crowd APIs
//!
//! # Examples
//!
//! ```rust,no_run
//! use stash_users::auth::{resolve_credentials, CredentialOptions, TerminalPrompter};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CredentialOptions::default();
//! let credentials = resolve_credentials(&options, &mut TerminalPrompter)?;
//! println!("{} distinct token(s)", credentials.distinct_tokens());
//! # Ok(())
//! # }
//! ```

pub mod credentials;

// Re-export main public API
pub use credentials::{
    resolve_credentials, Api, BasicAuthToken, CredentialFile, CredentialOptions, CredentialSet,
    LoginFlags, Prompter, TerminalPrompter,
};
