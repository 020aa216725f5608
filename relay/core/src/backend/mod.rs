//! Chat Transport
//!
//! Client-side access to the proxy through a common trait, so the exchange
//! driver and the terminal surface can be exercised against a mock.
//!
//! # Usage
//!
//! ```ignore
//! use relay_core::{ChatTransport, HttpTransport, RelayConfig};
//!
//! let transport = HttpTransport::from_config(&RelayConfig::default())?;
//! let body = transport.send_chat(&request).await?;
//! ```

mod http;
mod traits;

pub use http::{build_http_client, send_bounded, HttpTransport};
pub use traits::{ByteStream, ChatTransport, PdfUpload};
