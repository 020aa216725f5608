//! HTTP Transport Implementation
//!
//! Talks to the proxy over HTTP with `reqwest`.
//!
//! # Proxy API
//!
//! - `POST /api/chat` - JSON request, streamed `text/plain` reply
//! - `GET /api/health` - JSON health payload
//! - `POST /api/upload-pdf` - multipart upload (`file`, `api_key`)
//!
//! Only the wait for response headers is bounded. Once a body starts
//! streaming it is read for as long as the server keeps sending.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use super::traits::{ByteStream, ChatTransport, PdfUpload};
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::messages::{ChatRequest, HealthStatus, UploadReceipt};

/// Build a client with a connect timeout and no overall request timeout
///
/// # Errors
///
/// Returns [`RelayError::ClientSetup`] if the TLS backend fails to initialize.
pub fn build_http_client(connect_timeout: Duration) -> Result<reqwest::Client, RelayError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| RelayError::ClientSetup(e.to_string()))
}

/// Send `request`, waiting at most `wait` for response headers
///
/// A non-success status is an error; its body is dropped unread.
///
/// # Errors
///
/// - [`RelayError::BackendError`] with no status if `wait` expires
/// - [`RelayError::BackendError`] with the status for a non-2xx answer
/// - [`RelayError::BackendUnreachable`] for connection failures
pub async fn send_bounded(
    request: reqwest::RequestBuilder,
    wait: Duration,
    url: &str,
) -> Result<reqwest::Response, RelayError> {
    let response = match tokio::time::timeout(wait, request.send()).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return Err(RelayError::from_send(url, &e)),
        Err(_) => return Err(RelayError::timed_out(wait)),
    };

    let status = response.status();
    if !status.is_success() {
        return Err(RelayError::status(status.as_u16()));
    }
    Ok(response)
}

/// Whether a successful response is defined to carry no body
fn is_bodyless(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::NO_CONTENT || status == reqwest::StatusCode::RESET_CONTENT
}

/// HTTP transport to the proxy
#[derive(Clone, Debug)]
pub struct HttpTransport {
    /// Proxy base address (no trailing slash)
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
    /// Bounded wait for response headers
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for the proxy at `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientSetup`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, RelayError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            base_url,
            http_client: build_http_client(connect_timeout)?,
            request_timeout,
        })
    }

    /// Create from a resolved configuration (uses `proxy_url`)
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientSetup`] if the HTTP client cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Self::new(
            config.proxy_url.clone(),
            config.request_timeout,
            config.connect_timeout,
        )
    }

    /// Proxy base address
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an API path
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn send_chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>, RelayError> {
        let url = self.endpoint("api/chat");
        tracing::debug!(url = %url, request = %request.summary(), "Sending chat request");

        let response = send_bounded(
            self.http_client.post(&url).json(request),
            self.request_timeout,
            &url,
        )
        .await?;

        if is_bodyless(response.status()) {
            tracing::warn!(status = %response.status(), "Chat response has no body");
            return Ok(None);
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| RelayError::Stream(e.to_string()))
            })
            .boxed();
        Ok(Some(body))
    }

    async fn health(&self) -> Result<HealthStatus, RelayError> {
        let url = self.endpoint("api/health");
        let response =
            send_bounded(self.http_client.get(&url), self.request_timeout, &url).await?;

        response
            .json::<HealthStatus>()
            .await
            .map_err(|e| RelayError::InvalidResponse(e.to_string()))
    }

    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadReceipt, RelayError> {
        let url = self.endpoint("api/upload-pdf");
        let size = upload.bytes.len();
        tracing::info!(file = %upload.file_name, bytes = size, "Uploading PDF");

        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("application/pdf")
            .map_err(|e| RelayError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", upload.api_key);

        let response = send_bounded(
            self.http_client.post(&url).multipart(form),
            self.request_timeout,
            &url,
        )
        .await
        .map_err(|e| RelayError::Upload(e.to_string()))?;

        let receipt = response
            .json::<UploadReceipt>()
            .await
            .map_err(|e| RelayError::Upload(e.to_string()))?;

        if !receipt.is_usable() {
            return Err(RelayError::Upload("empty response from server".to_string()));
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base, Duration::from_secs(5), Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let transport = transport("http://127.0.0.1:3000/");
        assert_eq!(transport.base_url(), "http://127.0.0.1:3000");
        assert_eq!(
            transport.endpoint("/api/chat"),
            "http://127.0.0.1:3000/api/chat"
        );
        assert_eq!(
            transport.endpoint("api/health"),
            "http://127.0.0.1:3000/api/health"
        );
    }

    #[test]
    fn test_bodyless_statuses() {
        assert!(is_bodyless(reqwest::StatusCode::NO_CONTENT));
        assert!(is_bodyless(reqwest::StatusCode::RESET_CONTENT));
        assert!(!is_bodyless(reqwest::StatusCode::OK));
    }

    #[tokio::test]
    async fn test_unreachable_proxy() {
        // Port 9 (discard) is closed on test hosts.
        let transport = transport("http://127.0.0.1:9");
        let request = ChatRequest {
            conversation_history: Vec::new(),
            current_user_message: "hi".to_string(),
            system_message: None,
            model: None,
            api_key: String::new(),
        };

        let result = transport.send_chat(&request).await;
        assert!(matches!(result, Err(RelayError::BackendUnreachable { .. })));
        assert!(!transport.health_check().await);
    }
}
