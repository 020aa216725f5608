//! Upstream Client
//!
//! Forwards opaque request bodies to the chat backend. The body and its
//! `Content-Type` (including any multipart boundary) are sent exactly as
//! received.

use std::time::Duration;

use axum::body::Bytes;
use axum::http::HeaderValue;
use relay_core::backend::{build_http_client, send_bounded};
use relay_core::{RelayConfig, RelayError};

/// HTTP client bound to one upstream origin
#[derive(Clone, Debug)]
pub struct Upstream {
    /// Upstream base address (no trailing slash)
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Bounded wait for response headers
    request_timeout: Duration,
}

impl Upstream {
    /// Create a client for the upstream at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientSetup`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: build_http_client(connect_timeout)?,
            request_timeout,
        })
    }

    /// Create from a resolved configuration (uses `upstream_url`)
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientSetup`] if the HTTP client cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Self::new(
            config.upstream_url.clone(),
            config.request_timeout,
            config.connect_timeout,
        )
    }

    /// Upstream base address
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full upstream URL for a path
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST `body` unmodified to `path`
    ///
    /// Resolves once a successful status and headers arrive; the body is left
    /// unread for the caller to stream.
    ///
    /// # Errors
    ///
    /// Any [`RelayError`] from [`send_bounded`].
    pub async fn forward(
        &self,
        path: &str,
        content_type: Option<HeaderValue>,
        body: Bytes,
    ) -> Result<reqwest::Response, RelayError> {
        let url = self.endpoint(path);
        tracing::debug!(url = %url, bytes = body.len(), "Forwarding request upstream");

        let mut request = self.http_client.post(&url).body(body);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        send_bounded(request, self.request_timeout, &url).await
    }

    /// GET `path`
    ///
    /// # Errors
    ///
    /// Any [`RelayError`] from [`send_bounded`].
    pub async fn get(&self, path: &str) -> Result<reqwest::Response, RelayError> {
        let url = self.endpoint(path);
        send_bounded(self.http_client.get(&url), self.request_timeout, &url).await
    }
}
