//! Error types for stash_users
//!
//! This module defines the error types for all components of the application.
//! Errors are designed to be actionable and provide clear context for debugging and
//! user feedback.

use std::path::PathBuf;
use thiserror::Error;

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Password could not be read from the terminal
    #[error("Failed to read the {api} password from the terminal")]
    PasswordPrompt {
        api: String,
        #[source]
        source: std::io::Error,
    },

    /// Username could not be read from standard input
    #[error("Failed to read the {api} username")]
    UsernamePrompt {
        api: String,
        #[source]
        source: std::io::Error,
    },

    /// Username resolved to an empty string
    #[error("No username provided for {api}")]
    EmptyUsername { api: String },

    /// A pre-encoded token was supplied but is not valid Base64
    #[error("Token is not valid Base64: {reason}")]
    InvalidToken { reason: String },
}

/// Errors raised while paging through the directory API
#[derive(Error, Debug)]
pub enum FetchError {
    /// Too many failed page requests
    #[error("Too many failed requests ({errors}); last failure: {last_status}")]
    TooManyErrors { errors: u32, last_status: String },

    /// Page body could not be decoded
    #[error("Failed to decode page at offset {start}")]
    Decode {
        start: u32,
        #[source]
        source: serde_json::Error,
    },

    /// Request URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// Errors raised while issuing deactivation calls
#[derive(Error, Debug)]
pub enum UpdateError {
    /// HTTP transport failure
    #[error("Request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request URL could not be built
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Missing required configuration field
    #[error("Missing required argument: {field}")]
    MissingField { field: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// HTTP client could not be built
    #[error("Failed to build HTTP client")]
    HttpClient(#[from] reqwest::Error),
}

/// Log file setup errors
#[derive(Error, Debug)]
pub enum LogError {
    /// Log directory could not be created
    #[error("Failed to create log directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Log file could not be opened
    #[error("Failed to open log file {path}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Global subscriber already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),

    /// Log filter directive did not parse
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Credential error
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Pagination error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Deactivation error
    #[error(transparent)]
    Update(#[from] UpdateError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging setup error
    #[error(transparent)]
    Log(#[from] LogError),
}

impl AppError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "authentication",
            AppError::Fetch(_) => "fetch",
            AppError::Update(_) => "update",
            AppError::Config(_) => "config",
            AppError::Log(_) => "logging",
        }
    }

    /// Whether the error happened before the log file was opened
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Log(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Authentication result type alias
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Update result type alias
pub type UpdateResult<T> = std::result::Result<T, UpdateError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
