//! Core HTTP operations against a Basic-Auth protected REST API
//!
//! Requests are sent one at a time and never retried here; the callers own
//! the error counting policy.

use reqwest::{Client, Method, Response};
use url::Url;

use crate::auth::BasicAuthToken;

/// HTTP operations handler carrying the credentials of one API
#[derive(Debug, Clone)]
pub struct HttpHandler {
    client: Client,
    token: BasicAuthToken,
}

impl HttpHandler {
    /// Creates a new HttpHandler for the given client and token
    pub fn new(client: Client, token: BasicAuthToken) -> Self {
        Self { client, token }
    }

    /// Issues a GET request
    pub async fn get(&self, url: &Url) -> reqwest::Result<Response> {
        self.send(Method::GET, url, None).await
    }

    /// Issues a request with an optional form-encoded body
    ///
    /// The response is returned whatever its status; only transport failures
    /// surface as errors.
    pub async fn send(
        &self,
        method: Method,
        url: &Url,
        form: Option<&[(&str, &str)]>,
    ) -> reqwest::Result<Response> {
        let mut request = self
            .client
            .request(method.clone(), url.as_str())
            .header(reqwest::header::AUTHORIZATION, self.token.header_value())
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(fields) = form {
            request = request.form(fields);
        }

        let response = request.send().await?;
        tracing::debug!("{} {} -> {}", method, url, response.status());
        Ok(response)
    }
}
