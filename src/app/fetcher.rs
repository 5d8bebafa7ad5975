//! Paginated retrieval of group members from the directory API
//!
//! The fetcher walks the `limit`/`start` window until the server flags a page
//! as the last one. The offset only advances after a successful page, so a
//! failed request is simply issued again on the next iteration. Failed
//! requests share one counter for the whole run; once it exceeds the
//! configured ceiling the fetch is aborted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use stash_users::app::{ApiClient, ClientConfig, PageFetcher};
//! use stash_users::auth::BasicAuthToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = ClientConfig::default().build_http_client()?;
//! let client = ApiClient::new(http, "https://bitbucket.example.com", BasicAuthToken::encode("admin", "secret"));
//!
//! let pages: Vec<_> = PageFetcher::new(client, 100).into_stream().try_collect().await?;
//! println!("{} pages", pages.len());
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, Stream};
use reqwest::StatusCode;

use crate::app::client::ApiClient;
use crate::app::models::Page;
use crate::constants::directory;
use crate::errors::{FetchError, FetchResult};

/// Counters collected while paging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    /// Pages decoded successfully
    pub pages: u32,
    /// Sum of the `size` reported by each page
    pub users: u64,
    /// Failed requests (non-200 and transport failures)
    pub errors: u32,
}

/// Lazy, finite walk over the group membership listing
#[derive(Debug)]
pub struct PageFetcher {
    client: ApiClient,
    members_path: String,
    group: String,
    page_size: u32,
    max_errors: u32,
    start: u32,
    finished: bool,
    stats: FetchStats,
}

impl PageFetcher {
    /// Creates a fetcher for the default `stash-users` group listing
    pub fn new(client: ApiClient, page_size: u32) -> Self {
        Self {
            client,
            members_path: directory::MEMBERS_PATH.to_string(),
            group: directory::GROUP_CONTEXT.to_string(),
            page_size,
            max_errors: directory::MAX_FETCH_ERRORS,
            start: 0,
            finished: false,
            stats: FetchStats::default(),
        }
    }

    /// Use a different listing resource and group context
    pub fn with_resource(mut self, members_path: impl Into<String>, group: impl Into<String>) -> Self {
        self.members_path = members_path.into();
        self.group = group.into();
        self
    }

    /// Number of failed requests tolerated before aborting
    pub fn with_max_errors(mut self, max_errors: u32) -> Self {
        self.max_errors = max_errors;
        self
    }

    /// Counters so far
    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Offset of the next page to request
    pub fn next_start(&self) -> u32 {
        self.start
    }

    /// Whether the last page was returned or the walk was aborted
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next page, `None` once the last page has been returned
    ///
    /// # Errors
    ///
    /// Returns `FetchError::TooManyErrors` once the failure ceiling is
    /// exceeded and `FetchError::Decode` for a body that is not a page.
    /// Both end the walk. Transport failures and unreadable bodies count
    /// toward the ceiling the same way non-200 responses do, and the request
    /// is re-issued at the same offset.
    pub async fn next_page(&mut self) -> FetchResult<Option<Page>> {
        while !self.finished {
            let url = self.page_url()?;
            tracing::debug!("Requesting {} users from offset {}", self.page_size, self.start);

            let response = match self.client.get(&url).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Request to {} failed: {}", url, e);
                    self.record_failure(e.to_string())?;
                    continue;
                }
            };

            let status = response.status();
            if status != StatusCode::OK {
                tracing::warn!("Request failed: {}", status);
                self.record_failure(status.to_string())?;
                continue;
            }
            tracing::trace!("--> Status 200 OK");

            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::error!("Reading page at offset {} failed: {}", self.start, e);
                    self.record_failure(e.to_string())?;
                    continue;
                }
            };

            let page = Page::from_json(&body).map_err(|source| {
                self.finished = true;
                tracing::error!("Malformed page at offset {}: {}", self.start, source);
                FetchError::Decode {
                    start: self.start,
                    source,
                }
            })?;

            self.start += self.page_size;
            self.finished = page.is_last_page;
            self.stats.pages += 1;
            self.stats.users += u64::from(page.size);

            return Ok(Some(page));
        }

        Ok(None)
    }

    /// Turn the fetcher into a stream of pages
    ///
    /// The stream ends after the last page or after the first error.
    pub fn into_stream(self) -> impl Stream<Item = FetchResult<Page>> {
        stream::try_unfold(self, |mut fetcher| async move {
            let page = fetcher.next_page().await?;
            Ok::<_, FetchError>(page.map(|page| (page, fetcher)))
        })
    }

    fn page_url(&mut self) -> FetchResult<url::Url> {
        let limit = self.page_size.to_string();
        let start = self.start.to_string();
        let query = [
            ("context", self.group.as_str()),
            ("limit", limit.as_str()),
            ("start", start.as_str()),
        ];

        self.client
            .endpoint(&self.members_path, &query)
            .map_err(|error| {
                self.finished = true;
                FetchError::InvalidUrl {
                    url: format!("{}{}", self.client.host(), self.members_path),
                    error,
                }
            })
    }

    fn record_failure(&mut self, last_status: String) -> FetchResult<()> {
        self.stats.errors += 1;
        if self.stats.errors > self.max_errors {
            self.finished = true;
            tracing::error!("Too many errors with Status Code: {}", last_status);
            return Err(FetchError::TooManyErrors {
                errors: self.stats.errors,
                last_status,
            });
        }
        Ok(())
    }
}
