//! stash_users library
//!
//! Finds the members of a Bitbucket group that have been inactive for a long
//! time and deactivates the ones that never logged in through the Crowd
//! user-management API.

pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
