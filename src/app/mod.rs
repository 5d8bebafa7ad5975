//! Core application logic for stash_users
//!
//! This module contains the API client, the data models, the paginated
//! fetcher, the inactivity classifier, the batch updater and the session that
//! ties them together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use stash_users::app::{classify, ApiClient, ClientConfig, InactivityBucket, PageFetcher};
//! use stash_users::auth::BasicAuthToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = ClientConfig::default().build_http_client()?;
//! let client = ApiClient::new(http, "https://bitbucket.example.com", BasicAuthToken::encode("admin", "secret"));
//!
//! let mut fetcher = PageFetcher::new(client, 100);
//! while let Some(page) = fetcher.next_page().await? {
//!     let buckets = classify(&page.values, Utc::now());
//!     println!("{:?}", buckets.get(InactivityBucket::NeverAuthenticated));
//! }
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod client;
pub mod fetcher;
pub mod models;
pub mod session;
pub mod updater;

// Re-export main public API
pub use classifier::{buckets_for, classify, BucketSet, InactivityBucket};
pub use client::{ApiClient, ClientConfig};
pub use fetcher::{FetchStats, PageFetcher};
pub use models::{Page, UserRecord};
pub use session::{run_session, SessionSummary};
pub use updater::{BatchReport, BatchUpdater, DeactivationMode, UserOutcome};
