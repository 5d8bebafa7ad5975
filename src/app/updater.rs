//! Batch deactivation of users in the user-management API
//!
//! Users are processed one at a time, in the order given. A failed call is
//! logged and the batch moves on; nothing is retried or rolled back. In
//! simulation mode no request leaves the process and every user is reported
//! as a synthetic success.

use indicatif::ProgressBar;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::client::ApiClient;
use crate::constants::management;
use crate::errors::{UpdateError, UpdateResult};

/// Shape of the deactivation call
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum DeactivationMode {
    /// `PUT .../user?username=<name>` with a `name=<name>` form body
    #[default]
    UpdateUser,
    /// `DELETE .../group/user/direct?groupname=<group>&username=<name>`
    RemoveMembership,
}

impl DeactivationMode {
    /// HTTP method of the call
    pub fn method(&self) -> Method {
        match self {
            Self::UpdateUser => Method::PUT,
            Self::RemoveMembership => Method::DELETE,
        }
    }

    /// Default resource path below the management host
    pub fn default_path(&self) -> &'static str {
        match self {
            Self::UpdateUser => management::USER_PATH,
            Self::RemoveMembership => management::MEMBERSHIP_PATH,
        }
    }
}

/// Result of one deactivation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOutcome {
    /// User the call was made for
    pub username: String,
    /// HTTP status, `None` on transport failure
    pub status: Option<u16>,
    /// Status line or error text
    pub detail: String,
    /// Whether the call was simulated
    pub simulated: bool,
}

impl UserOutcome {
    /// 200 and 204 count as success
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(200) | Some(204))
    }
}

/// Outcomes of a batch, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<UserOutcome>,
}

impl BatchReport {
    /// Users processed
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    /// Successful calls
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Failed calls
    pub fn failed(&self) -> usize {
        self.processed() - self.succeeded()
    }

    /// Usernames whose call failed
    pub fn failed_users(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.username.as_str())
            .collect()
    }
}

/// Issues deactivation calls for a list of usernames
#[derive(Debug, Clone)]
pub struct BatchUpdater {
    client: ApiClient,
    mode: DeactivationMode,
    group: String,
    path: String,
    simulate: bool,
}

impl BatchUpdater {
    /// Creates an updater; `simulate` suppresses every network call
    pub fn new(client: ApiClient, mode: DeactivationMode, simulate: bool) -> Self {
        Self {
            client,
            mode,
            group: management::DEFAULT_GROUP.to_string(),
            path: mode.default_path().to_string(),
            simulate,
        }
    }

    /// Group used by [`DeactivationMode::RemoveMembership`]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Resource path the mode's call goes to
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Deactivate every user in order, advancing `progress` once per user
    pub async fn deactivate(&self, usernames: &[String], progress: &ProgressBar) -> BatchReport {
        let total = usernames.len();
        let mut report = BatchReport {
            outcomes: Vec::with_capacity(total),
        };

        for (index, username) in usernames.iter().enumerate() {
            tracing::trace!("--> [{}/{}] Deactivating user {} ...", index + 1, total, username);

            let outcome = match self.update_user(username).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("{}", e);
                    UserOutcome {
                        username: username.clone(),
                        status: None,
                        detail: e.to_string(),
                        simulated: false,
                    }
                }
            };

            if outcome.is_success() {
                if outcome.simulated {
                    tracing::trace!("--> << SIMULATION >> User {} deactivated", username);
                } else {
                    tracing::trace!("--> User {} deactivated", username);
                }
            } else {
                tracing::error!(
                    "An error ocurred while trying to deactivate the user {}: {}",
                    username,
                    outcome.detail
                );
            }

            report.outcomes.push(outcome);
            progress.inc(1);
        }

        report
    }

    /// Issue (or simulate) the call for one user
    ///
    /// # Errors
    ///
    /// Returns `UpdateError` on transport failure or an unbuildable URL;
    /// HTTP error statuses are reported in the outcome instead.
    pub async fn update_user(&self, username: &str) -> UpdateResult<UserOutcome> {
        let url = self.target_url(username)?;

        if self.simulate {
            tracing::debug!("Simulating {} {}", self.mode.method(), url);
            return Ok(UserOutcome {
                username: username.to_string(),
                status: Some(StatusCode::OK.as_u16()),
                detail: management::SIMULATED_STATUS.to_string(),
                simulated: true,
            });
        }

        let form = [("name", username)];
        let body = match self.mode {
            DeactivationMode::UpdateUser => Some(&form[..]),
            DeactivationMode::RemoveMembership => None,
        };

        let response = self
            .client
            .send(self.mode.method(), &url, body)
            .await
            .map_err(|source| UpdateError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        Ok(UserOutcome {
            username: username.to_string(),
            status: Some(status.as_u16()),
            detail: status.to_string(),
            simulated: false,
        })
    }

    /// URL the call for `username` goes to
    pub fn target_url(&self, username: &str) -> UpdateResult<Url> {
        let query: Vec<(&str, &str)> = match self.mode {
            DeactivationMode::UpdateUser => vec![("username", username)],
            DeactivationMode::RemoveMembership => {
                vec![("groupname", self.group.as_str()), ("username", username)]
            }
        };

        self.client
            .endpoint(&self.path, &query)
            .map_err(|error| UpdateError::InvalidUrl {
                url: format!("{}{}", self.client.host(), self.path),
                error,
            })
    }
}
