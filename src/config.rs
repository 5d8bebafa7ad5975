//! Configuration management for stash_users
//!
//! Settings come from an optional TOML file and the command line. The file is
//! looked up at `--config`, `./stash-users.toml` and then
//! `<config dir>/stash-users/config.toml`; command-line flags win over file
//! values. The merged result is an immutable [`RunConfig`] that the session
//! borrows for the whole run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::{ClientConfig, DeactivationMode};
use crate::auth::CredentialOptions;
use crate::cli::{Cli, ProgressConfig};
use crate::constants::{directory, http, management};
use crate::errors::{ConfigError, ConfigResult};

/// Configuration file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "stash-users.toml";

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Directory (Bitbucket) API settings
    pub directory: DirectoryConfigToml,
    /// User-management (Crowd) API settings
    pub management: ManagementConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Log and console settings
    pub logging: LoggingConfigToml,
}

/// TOML-friendly directory API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfigToml {
    /// Base URL, overridden by `--api`
    pub host: Option<String>,
    /// Group membership listing resource
    pub members_path: String,
    /// Group passed as `context`
    pub group: String,
    /// Users requested per page
    pub page_size: u32,
    /// Failed requests tolerated before aborting
    pub max_errors: u32,
}

impl Default for DirectoryConfigToml {
    fn default() -> Self {
        Self {
            host: None,
            members_path: directory::MEMBERS_PATH.to_string(),
            group: directory::GROUP_CONTEXT.to_string(),
            page_size: directory::DEFAULT_PAGE_SIZE,
            max_errors: directory::MAX_FETCH_ERRORS,
        }
    }
}

/// TOML-friendly user-management API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagementConfigToml {
    /// Base URL, overridden by `--crowd-api`; falls back to the directory host
    pub host: Option<String>,
    /// Deactivation call to issue
    pub mode: DeactivationMode,
    /// User resource used by `update-user`
    pub user_path: String,
    /// Direct membership resource used by `remove-membership`
    pub membership_path: String,
    /// Group used by `remove-membership`
    pub group: String,
    /// Reuse the directory credentials
    pub shared_credentials: bool,
}

impl Default for ManagementConfigToml {
    fn default() -> Self {
        Self {
            host: None,
            mode: DeactivationMode::default(),
            user_path: management::USER_PATH.to_string(),
            membership_path: management::MEMBERSHIP_PATH.to_string(),
            group: management::DEFAULT_GROUP.to_string(),
            shared_credentials: false,
        }
    }
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Accept self-signed certificates
    pub accept_invalid_certs: bool,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            accept_invalid_certs: self.accept_invalid_certs,
            ..ClientConfig::default()
        }
    }
}

/// TOML-friendly logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfigToml {
    /// Log directory, overridden by `--log`
    pub dir: Option<PathBuf>,
    /// Draw the progress bar on a terminal
    pub progress_bar: bool,
}

impl Default for LoggingConfigToml {
    fn default() -> Self {
        Self {
            dir: None,
            progress_bar: true,
        }
    }
}

impl AppConfig {
    /// Load the configuration file, or defaults when none exists
    ///
    /// An explicitly given path must exist; the default locations are
    /// optional.
    pub async fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        let path = match config_file_override {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                })
            }
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        match path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found in standard locations");
                Ok(Self::default())
            }
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| path.exists())
    }

    /// Per-user config file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stash-users").join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::from_toml(&content)?;
        debug!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse configuration text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Settings for one run, fixed before any request is made
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory API base URL, without trailing slash
    pub directory_host: String,
    /// User-management API base URL, without trailing slash
    pub management_host: String,
    pub members_path: String,
    pub group: String,
    pub page_size: u32,
    pub max_errors: u32,
    pub mode: DeactivationMode,
    /// Resource path of the deactivation call for `mode`
    pub management_path: String,
    /// Group used by `remove-membership`
    pub management_group: String,
    pub log_dir: PathBuf,
    pub verbose: bool,
    pub simulation: bool,
    pub client: ClientConfig,
    pub progress: ProgressConfig,
    pub credentials: CredentialOptions,
}

impl RunConfig {
    /// Merge command-line flags over file values and validate the result
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingField` when no host or log directory is given,
    /// `ConfigError::InvalidValue` for a malformed host or a zero page size.
    pub fn from_sources(cli: &Cli, file: AppConfig) -> ConfigResult<Self> {
        let directory_host = cli
            .api
            .clone()
            .or(file.directory.host)
            .ok_or_else(|| ConfigError::MissingField {
                field: "--api".to_string(),
            })?;
        let directory_host = validate_host("--api", &directory_host)?;

        let management_host = match cli.crowd_api.clone().or(file.management.host) {
            Some(host) => validate_host("--crowd-api", &host)?,
            None => directory_host.clone(),
        };

        let log_dir = cli
            .log
            .clone()
            .or(file.logging.dir)
            .ok_or_else(|| ConfigError::MissingField {
                field: "--log".to_string(),
            })?;

        let page_size = cli.page_size.unwrap_or(file.directory.page_size);
        if page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size".to_string(),
                value: page_size.to_string(),
                reason: "Page size must be greater than 0".to_string(),
            });
        }

        let mode = cli.mode.unwrap_or(file.management.mode);
        let management_path = match mode {
            DeactivationMode::UpdateUser => file.management.user_path,
            DeactivationMode::RemoveMembership => file.management.membership_path,
        };

        let mut credentials = cli.credential_options();
        credentials.shared |= file.management.shared_credentials;

        Ok(Self {
            directory_host,
            management_host,
            members_path: file.directory.members_path,
            group: file.directory.group,
            page_size,
            max_errors: file.directory.max_errors,
            mode,
            management_path,
            management_group: file.management.group,
            log_dir,
            verbose: cli.verbose,
            simulation: cli.simulation,
            client: file.client.to_runtime_config(),
            progress: ProgressConfig {
                enable_progress_bar: file.logging.progress_bar && !cli.no_progress,
                ..ProgressConfig::default()
            },
            credentials,
        })
    }
}

fn validate_host(field: &str, host: &str) -> ConfigResult<String> {
    let trimmed = host.trim().trim_end_matches('/');
    let invalid = |reason: String| ConfigError::InvalidValue {
        field: field.to_string(),
        value: host.to_string(),
        reason,
    };

    let url = url::Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("Host must be an http or https URL".to_string()));
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stash_users").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.directory.page_size, directory::DEFAULT_PAGE_SIZE);
        assert_eq!(config.directory.max_errors, 5);
        assert_eq!(config.directory.group, "stash-users");
        assert_eq!(config.management.mode, DeactivationMode::UpdateUser);
        assert!(config.logging.progress_bar);
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(&config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("stash-users.toml");

        let test_config = r#"
[directory]
host = "https://bitbucket.example.com/"
page_size = 50

[management]
host = "https://crowd.example.com"
mode = "remove-membership"
membership_path = "/crowd/rest/usermanagement/1/group/user/direct"

[logging]
dir = "/var/log/stash-users"
progress_bar = false
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load(Some(&config_path)).await.unwrap();

        assert_eq!(config.directory.page_size, 50);
        assert_eq!(config.management.mode, DeactivationMode::RemoveMembership);
        assert_eq!(
            config.management.membership_path,
            "/crowd/rest/usermanagement/1/group/user/direct"
        );
        assert_eq!(config.management.user_path, management::USER_PATH);
        assert!(!config.logging.progress_bar);
        // Unspecified values keep their defaults
        assert_eq!(config.directory.max_errors, directory::MAX_FETCH_ERRORS);
        assert_eq!(config.client.request_timeout_secs, 60);
    }

    #[test]
    fn test_invalid_toml() {
        let result = AppConfig::from_toml("[directory]\npage_size = \"many\"");
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_host_and_log() {
        let err = RunConfig::from_sources(&cli(&["-l", "/tmp/logs"]), AppConfig::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: --api");

        let err = RunConfig::from_sources(
            &cli(&["-a", "https://bitbucket.example.com"]),
            AppConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Missing required argument: --log");
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = AppConfig::default();
        file.directory.host = Some("https://file.example.com".to_string());
        file.directory.page_size = 10;
        file.logging.dir = Some(PathBuf::from("/file/logs"));

        let config = RunConfig::from_sources(
            &cli(&[
                "-a",
                "https://bitbucket.example.com/",
                "--page-size",
                "20",
                "--simulation",
                "false",
            ]),
            file,
        )
        .unwrap();

        assert_eq!(config.directory_host, "https://bitbucket.example.com");
        assert_eq!(config.management_host, "https://bitbucket.example.com");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.log_dir, PathBuf::from("/file/logs"));
        assert!(!config.simulation);
    }

    #[test]
    fn test_management_path_follows_mode() {
        let mut file = AppConfig::default();
        file.management.user_path = "/custom/user".to_string();
        file.management.membership_path = "/custom/membership".to_string();
        let base = ["-a", "https://bitbucket.example.com", "-l", "/tmp/logs"];

        let config = RunConfig::from_sources(&cli(&base), file.clone()).unwrap();
        assert_eq!(config.mode, DeactivationMode::UpdateUser);
        assert_eq!(config.management_path, "/custom/user");

        let mut args = base.to_vec();
        args.extend(["--mode", "remove-membership"]);
        let config = RunConfig::from_sources(&cli(&args), file).unwrap();
        assert_eq!(config.management_path, "/custom/membership");
    }

    #[test]
    fn test_separate_management_host() {
        let config = RunConfig::from_sources(
            &cli(&[
                "-a",
                "https://bitbucket.example.com",
                "--crowd-api",
                "https://crowd.example.com/",
                "-l",
                "/tmp/logs",
            ]),
            AppConfig::default(),
        )
        .unwrap();

        assert_eq!(config.management_host, "https://crowd.example.com");
        assert!(config.simulation);
    }

    #[test]
    fn test_invalid_values() {
        let result = RunConfig::from_sources(
            &cli(&["-a", "bitbucket", "-l", "/tmp/logs"]),
            AppConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let result = RunConfig::from_sources(
            &cli(&[
                "-a",
                "https://bitbucket.example.com",
                "-l",
                "/tmp/logs",
                "--page-size",
                "0",
            ]),
            AppConfig::default(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
