//! Streaming UTF-8 decoding
//!
//! Chunk boundaries are arbitrary, so a multi-byte character can arrive split
//! across two reads. The decoder holds the incomplete tail back until the next
//! chunk completes it.

/// Incremental UTF-8 decoder
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of an incomplete trailing sequence
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a decoder with nothing buffered
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning every complete character it finishes
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end of
    /// the chunk is held back for the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[bad..];
                        }
                        None => {
                            rest = tail;
                            break;
                        }
                    }
                }
            }
        }

        let consumed = self.pending.len() - rest.len();
        self.pending.drain(..consumed);
        out
    }

    /// Flush at end of stream
    ///
    /// A dangling partial sequence becomes a single U+FFFD.
    pub fn finish(&mut self) -> Option<char> {
        if self.pending.is_empty() {
            return None;
        }
        self.pending.clear();
        Some(char::REPLACEMENT_CHARACTER)
    }

    /// Whether a partial sequence is waiting for more bytes
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
