//! HTTP client for the directory and user-management REST APIs
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: authenticated request operations

use reqwest::{Method, Response};
use url::Url;

use crate::auth::BasicAuthToken;

pub mod config;
pub mod http;

pub use config::ClientConfig;

use http::HttpHandler;

/// Authenticated handle on one REST API host
///
/// The host may carry a context path (e.g. `https://example.com/jira`);
/// resource paths are appended to it verbatim.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_handler: HttpHandler,
    host: String,
}

impl ApiClient {
    /// Creates a client for `host` authenticating with `token`
    pub fn new(client: reqwest::Client, host: &str, token: BasicAuthToken) -> Self {
        Self {
            http_handler: HttpHandler::new(client, token),
            host: host.trim_end_matches('/').to_string(),
        }
    }

    /// Builds the URL of a resource with its query parameters
    ///
    /// # Errors
    ///
    /// Returns the parse error message if host and path do not form a valid URL
    pub fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, String> {
        let raw = format!("{}{}", self.host, path);
        let mut url = Url::parse(&raw).map_err(|e| e.to_string())?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Issues a GET request
    pub async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        self.http_handler.get(url).await
    }

    /// Issues a request with an optional form body
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        form: Option<&[(&str, &str)]>,
    ) -> reqwest::Result<Response> {
        self.http_handler.send(method, url, form).await
    }

    /// Host this client talks to, without trailing slash
    pub fn host(&self) -> &str {
        &self.host
    }
}
