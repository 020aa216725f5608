//! Incremental Response Streaming
//!
//! Turns a proxied response body into the growing text a surface displays.
//!
//! # Contract
//!
//! - Chunks are read strictly one after another; each read is a suspension
//!   point and the observer for chunk `n` returns before chunk `n + 1` is read.
//! - After every chunk the observer receives the *entire* text accumulated so
//!   far, never just the delta, so a surface can re-render the whole message.
//! - The accumulated text only ever grows.
//! - A missing body fails with [`RelayError::NoBody`](crate::RelayError::NoBody)
//!   before anything is read; a failed read ends consumption with
//!   [`RelayError::Stream`](crate::RelayError::Stream).
//!
//! # Example
//!
//! ```ignore
//! use relay_core::stream::StreamConsumer;
//!
//! let body = transport.send_chat(&request).await?;
//! let text = StreamConsumer::new()
//!     .consume(body, &mut |full: &str| println!("{full}"))
//!     .await?;
//! ```

mod consumer;
mod decoder;

pub use consumer::{ChannelObserver, StreamConsumer, StreamObserver, StreamStats};
pub use decoder::Utf8Decoder;
