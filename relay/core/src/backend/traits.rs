//! Transport Traits
//!
//! The [`ChatTransport`] trait is the seam between conversation logic and the
//! network. Implementations own addressing, timeouts and wire encoding; callers
//! only see payloads, byte streams and [`RelayError`]s.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::RelayError;
use crate::messages::{ChatRequest, HealthStatus, UploadReceipt};

/// Response body as a stream of raw chunks
///
/// Chunk boundaries are arbitrary and may split multi-byte characters.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, RelayError>>;

/// A PDF to upload
#[derive(Clone)]
pub struct PdfUpload {
    /// File name reported to the backend
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
    /// Credential forwarded with the file
    pub api_key: String,
}

impl std::fmt::Debug for PdfUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfUpload")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Chat transport trait
///
/// Implement this trait to reach the backend by other means than HTTP.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Transport name for logs (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Send one chat request and return the response body
    ///
    /// Resolves once response headers arrive. `Ok(None)` means the response
    /// succeeded but carries no body.
    async fn send_chat(&self, request: &ChatRequest) -> Result<Option<ByteStream>, RelayError>;

    /// Fetch the backend health payload
    async fn health(&self) -> Result<HealthStatus, RelayError>;

    /// Upload a PDF for the backend to index
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadReceipt, RelayError>;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool {
        match self.health().await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(transport = self.name(), error = %e, "Health check failed");
                false
            }
        }
    }
}
