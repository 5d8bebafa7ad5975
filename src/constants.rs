//! Application constants for stash_users
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for credentials
pub mod env {
    /// Bitbucket (directory API) username
    pub const BITBUCKET_USERNAME: &str = "BITBUCKET_USERNAME";

    /// Bitbucket (directory API) password
    pub const BITBUCKET_PASSWORD: &str = "BITBUCKET_PASSWORD";

    /// Crowd (user-management API) username
    pub const CROWD_USERNAME: &str = "CROWD_USERNAME";

    /// Crowd (user-management API) password
    pub const CROWD_PASSWORD: &str = "CROWD_PASSWORD";

    /// Log filter override, same syntax as `RUST_LOG`
    pub const LOG_FILTER: &str = "STASH_USERS_LOG";
}

/// Credential file and prompt constants
pub mod auth {
    /// Credentials file label for the directory API
    pub const BITBUCKET_LABEL: &str = "bitbucket";

    /// Credentials file label for the user-management API
    pub const CROWD_LABEL: &str = "crowd";

    /// Scheme prefix some callers paste together with a token
    pub const BASIC_PREFIX: &str = "Basic ";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("stash_users/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
}

/// Bitbucket Server directory API
pub mod directory {
    /// Group membership listing resource
    pub const MEMBERS_PATH: &str = "/bitbucket/rest/api/1.0/admin/groups/more-members";

    /// Group whose members are audited
    pub const GROUP_CONTEXT: &str = "stash-users";

    /// Users requested per page
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Failed page requests tolerated before the run is aborted
    pub const MAX_FETCH_ERRORS: u32 = 5;
}

/// Crowd user-management API
pub mod management {
    /// User update resource
    pub const USER_PATH: &str = "/crowd/rest/usermanagement/latest/user";

    /// Direct group membership resource
    pub const MEMBERSHIP_PATH: &str = "/crowd/rest/usermanagement/latest/group/user/direct";

    /// Group the never-authenticated users are removed from
    pub const DEFAULT_GROUP: &str = "stash_users";

    /// Status text reported for simulated calls
    pub const SIMULATED_STATUS: &str = "Simulated call";
}

/// Inactivity thresholds
pub mod inactivity {
    /// Days without login for the three-month bucket
    pub const THREE_MONTHS_DAYS: i64 = 90;

    /// Days without login for the six-month bucket
    pub const SIX_MONTHS_DAYS: i64 = 180;
}

/// Log file constants
pub mod logging {
    /// Date format used in log file names
    pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

    /// Prefix of log files written in simulation mode
    pub const SIMULATION_PREFIX: &str = "sim";

    /// Log file extension
    pub const EXTENSION: &str = "log";

    /// Timestamp written after the level prefix on every line
    pub const LINE_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S%.6f";
}

// Re-export commonly used constants for convenience
pub use directory::{DEFAULT_PAGE_SIZE, MAX_FETCH_ERRORS};
pub use http::USER_AGENT;
