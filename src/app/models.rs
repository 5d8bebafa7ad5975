//! Data models for the Bitbucket Server directory API
//!
//! This module defines the records read from the group-membership listing.
//! Field names follow the camelCase keys of the REST payload.

use serde::{Deserialize, Serialize};

/// A single member of the audited group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Login name (e.g., "jdoe")
    pub name: String,
    /// Email address, empty when the directory has none
    #[serde(default)]
    pub email_address: String,
    /// Directory identifier
    #[serde(default)]
    pub id: i64,
    /// Whether the account is active in the directory
    #[serde(default)]
    pub active: bool,
    /// Account type (e.g., "NORMAL")
    #[serde(rename = "type", default)]
    pub user_type: String,
    /// Last authentication as epoch milliseconds, 0 when never authenticated
    #[serde(default)]
    pub last_authentication_timestamp: u64,
}

impl UserRecord {
    /// Whether the user has never authenticated
    pub fn never_authenticated(&self) -> bool {
        self.last_authentication_timestamp == 0
    }

    /// Last authentication as epoch seconds
    pub fn last_authentication_secs(&self) -> u64 {
        self.last_authentication_timestamp / 1000
    }
}

/// One page of the paginated membership listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Number of records on this page
    pub size: u32,
    /// Page size the server honoured
    pub limit: u32,
    /// Whether this is the final page
    pub is_last_page: bool,
    /// Offset of the first record on this page
    pub start: u32,
    /// Records in server order
    #[serde(default)]
    pub values: Vec<UserRecord>,
}

impl Page {
    /// Decode a page from a raw response body
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }
}
