//! Stream Consumer Implementation
//!
//! Reads a response body chunk by chunk, decodes it and hands the cumulative
//! text to an observer after every chunk.

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;

use super::decoder::Utf8Decoder;
use crate::error::RelayError;

/// Receives the cumulative response text after every chunk
pub trait StreamObserver {
    /// Called with the full text accumulated so far
    fn on_text(&mut self, text: &str);
}

impl<F> StreamObserver for F
where
    F: FnMut(&str),
{
    fn on_text(&mut self, text: &str) {
        self(text);
    }
}

/// Observer that forwards each cumulative snapshot over a channel
///
/// Snapshots sent after the receiver is dropped are discarded.
#[derive(Clone, Debug)]
pub struct ChannelObserver(pub mpsc::UnboundedSender<String>);

impl StreamObserver for ChannelObserver {
    fn on_text(&mut self, text: &str) {
        let _ = self.0.send(text.to_owned());
    }
}

/// Counters for one consumed stream
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Chunks read from the body
    pub chunks_received: usize,
    /// Raw bytes read from the body
    pub bytes_received: usize,
    /// Observer invocations
    pub updates_emitted: usize,
}

/// Accumulates one response body into text
///
/// One consumer serves exactly one in-flight request; it starts empty and is
/// dropped when the request settles.
#[derive(Debug, Default)]
pub struct StreamConsumer {
    decoder: Utf8Decoder,
    text: String,
    stats: StreamStats,
}

impl StreamConsumer {
    /// Create an empty consumer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Counters so far
    #[must_use]
    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Decode and append one chunk, returning the full text
    pub fn push_chunk(&mut self, bytes: &[u8]) -> &str {
        self.stats.chunks_received += 1;
        self.stats.bytes_received += bytes.len();
        let decoded = self.decoder.decode(bytes);
        self.text.push_str(&decoded);
        &self.text
    }

    /// Flush the decoder at end of stream
    ///
    /// Returns the full text only if a dangling partial character changed it.
    /// Observers are not notified; the flushed text is the caller's to use.
    pub fn finish(&mut self) -> Option<&str> {
        let replacement = self.decoder.finish()?;
        self.text.push(replacement);
        Some(&self.text)
    }

    /// Drain `body` to completion, notifying `observer` after every chunk
    ///
    /// The observer is invoked exactly once per chunk read and never for the
    /// end of the stream. If the body ends on a truncated multi-byte
    /// character, the replacement character appears only in the returned text.
    ///
    /// # Errors
    ///
    /// - [`RelayError::NoBody`] if `body` is `None`
    /// - whatever error the body yields for a failed read
    pub async fn consume<S, B, O>(
        mut self,
        body: Option<S>,
        observer: &mut O,
    ) -> Result<String, RelayError>
    where
        S: Stream<Item = Result<B, RelayError>> + Unpin,
        B: AsRef<[u8]>,
        O: StreamObserver + ?Sized,
    {
        let mut body = body.ok_or(RelayError::NoBody)?;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(
                        chunks = self.stats.chunks_received,
                        bytes = self.stats.bytes_received,
                        error = %e,
                        "Response stream failed"
                    );
                    return Err(e);
                }
            };
            let text = self.push_chunk(chunk.as_ref());
            observer.on_text(text);
            self.stats.updates_emitted += 1;
        }

        if self.finish().is_some() {
            tracing::debug!("Response stream ended inside a multi-byte character");
        }

        tracing::debug!(
            chunks = self.stats.chunks_received,
            bytes = self.stats.bytes_received,
            chars = self.text.chars().count(),
            "Response stream complete"
        );

        Ok(self.text)
    }
}
