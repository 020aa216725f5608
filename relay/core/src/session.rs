//! Session Management
//!
//! A [`ChatSession`] owns one conversation: the ordered history, the input
//! buffer, the credentials sent with each request, and the Idle/Streaming
//! state that guarantees at most one request is in flight.
//!
//! # State Machine
//!
//! ```text
//!            submit(text)                  on_chunk(full)
//!   ┌──────┐ ───────────────► ┌───────────┐ ◄──────┐
//!   │ Idle │                  │ Streaming │ ───────┘
//!   └──────┘ ◄─────────────── └───────────┘
//!      ▲    on_complete / on_error
//!      └── clear()
//! ```
//!
//! Transitions never perform I/O. `submit` hands back the [`ChatRequest`] to
//! send; the caller performs the exchange and feeds its outcome back in as
//! [`SessionEvent`]s. A transition attempted in the wrong state is a no-op
//! that reports itself as such instead of failing.

use crate::messages::{ChatMessage, ChatRequest, MessageRole};

/// Prefix for assistant entries that report a failed exchange
pub const ERROR_PREFIX: &str = "Error: ";

/// Whether a request is in flight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No request in flight
    #[default]
    Idle,
    /// One request in flight, zero or more chunks received
    Streaming,
}

impl SessionState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Streaming => "Sending...",
        }
    }
}

/// Outcome of an in-flight exchange, fed back into the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A chunk arrived; carries the full text received so far
    Chunk(String),
    /// The response stream ended normally
    Complete,
    /// The exchange failed; carries a human-readable description
    Failed(String),
}

/// Result of applying a transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// History or state changed; the view should re-render
    Applied,
    /// The transition was not valid in the current state
    Ignored,
}

impl Transition {
    fn from_applied(applied: bool) -> Self {
        if applied {
            Self::Applied
        } else {
            Self::Ignored
        }
    }

    /// Whether the transition changed anything
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

/// One conversation and its request lifecycle
#[derive(Clone, Default)]
pub struct ChatSession {
    /// Ordered history, oldest first
    history: Vec<ChatMessage>,
    /// Current lifecycle state
    state: SessionState,
    /// Whether the in-flight exchange has appended its assistant entry yet
    reply_started: bool,
    /// Text being composed
    input: String,
    /// Credential forwarded with each request
    api_key: String,
    /// Model requested (backend default when `None`)
    model: Option<String>,
    /// System prompt (backend default when `None`)
    system_message: Option<String>,
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("state", &self.state)
            .field("history", &self.history.len())
            .field("model", &self.model)
            .field("has_api_key", &self.has_api_key())
            .finish_non_exhaustive()
    }
}

impl ChatSession {
    /// Create an empty, idle session
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the model requested by later submissions
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the system message sent with later submissions
    #[must_use]
    pub fn with_system_message(mut self, system: impl Into<String>) -> Self {
        self.system_message = Some(system.into());
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.state == SessionState::Streaming
    }

    /// Conversation history, oldest first
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Most recent history entry
    #[must_use]
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.history.last()
    }

    /// Text being composed
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Mutable access to the text being composed
    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Model requested by the next submission
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Change the model for later submissions
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = Some(model.into());
    }

    /// System message sent with the next submission
    #[must_use]
    pub fn system_message(&self) -> Option<&str> {
        self.system_message.as_deref()
    }

    /// Change the system message for later submissions
    pub fn set_system_message(&mut self, system: Option<String>) {
        self.system_message = system;
    }

    /// Whether an API key has been provided
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Credential sent with the next submission
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Replace the API key for later submissions
    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Submit `text` as the next user message
    ///
    /// Valid only while idle and only for text that is not blank. Appends the
    /// user entry, clears the input buffer, enters `Streaming` and returns the
    /// request to send. Returns `None` (and changes nothing) otherwise.
    pub fn submit(&mut self, text: &str) -> Option<ChatRequest> {
        if self.is_streaming() {
            tracing::debug!("Submission rejected: a request is already in flight");
            return None;
        }
        if text.trim().is_empty() {
            tracing::debug!("Submission rejected: blank message");
            return None;
        }

        self.history.push(ChatMessage::user(text));
        self.input.clear();
        self.state = SessionState::Streaming;
        self.reply_started = false;

        let request = ChatRequest {
            conversation_history: self.history.clone(),
            current_user_message: text.to_string(),
            system_message: self.system_message.clone(),
            model: self.model.clone(),
            api_key: self.api_key.clone(),
        };
        tracing::debug!(request = %request.summary(), "Submitted message");
        Some(request)
    }

    /// Submit whatever is in the input buffer
    pub fn submit_input(&mut self) -> Option<ChatRequest> {
        let text = self.input.clone();
        self.submit(&text)
    }

    /// A chunk arrived; `full_text` is everything received so far
    ///
    /// The first chunk of an exchange appends the assistant entry; later
    /// chunks replace its content. Returns `false` when idle.
    pub fn on_chunk(&mut self, full_text: &str) -> bool {
        if !self.is_streaming() {
            tracing::debug!("Chunk ignored: no request in flight");
            return false;
        }
        self.set_reply(full_text.to_string());
        true
    }

    /// The response stream ended normally
    ///
    /// Returns to `Idle` without touching history. Returns `false` when idle.
    pub fn on_complete(&mut self) -> bool {
        if !self.is_streaming() {
            tracing::debug!("Completion ignored: no request in flight");
            return false;
        }
        self.finish_exchange();
        true
    }

    /// The exchange failed with `message`
    ///
    /// Writes `Error: <message>` as the assistant entry (appending it, or
    /// replacing a partial reply) and returns to `Idle`. Returns `false` when
    /// idle.
    pub fn on_error(&mut self, message: &str) -> bool {
        if !self.is_streaming() {
            tracing::debug!("Error ignored: no request in flight");
            return false;
        }
        tracing::warn!(error = %message, "Exchange failed");
        self.set_reply(format!("{ERROR_PREFIX}{message}"));
        self.finish_exchange();
        true
    }

    /// Reset history to empty
    ///
    /// Rejected while a request is in flight, so a live stream never writes
    /// into a cleared transcript. Idempotent when idle.
    pub fn clear(&mut self) -> bool {
        if self.is_streaming() {
            tracing::debug!("Clear rejected: a request is in flight");
            return false;
        }
        self.history.clear();
        self.reply_started = false;
        true
    }

    /// Apply an exchange event
    pub fn apply(&mut self, event: SessionEvent) -> Transition {
        let applied = match event {
            SessionEvent::Chunk(text) => self.on_chunk(&text),
            SessionEvent::Complete => self.on_complete(),
            SessionEvent::Failed(message) => self.on_error(&message),
        };
        Transition::from_applied(applied)
    }

    /// Append or replace the assistant entry of the current exchange
    fn set_reply(&mut self, content: String) {
        if self.reply_started {
            if let Some(last) = self.history.last_mut() {
                debug_assert_eq!(last.role, MessageRole::Assistant);
                // Replace the entry rather than editing it in place.
                *last = ChatMessage::assistant(content);
                return;
            }
        }
        self.history.push(ChatMessage::assistant(content));
        self.reply_started = true;
    }

    fn finish_exchange(&mut self) {
        self.state = SessionState::Idle;
        self.reply_started = false;
    }
}
