//! Wire Types
//!
//! Payloads exchanged between a surface, the proxy and the upstream backend.
//! Field names follow the backend's JSON contract (`snake_case`, lowercase
//! roles), so these types serialize straight onto the wire.

use serde::{Deserialize, Serialize};

/// Model preselected for new sessions
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Models offered for selection, in display order
pub const KNOWN_MODELS: &[&str] = &[
    "gpt-4.1-mini",
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-3.5-turbo",
];

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Backend reply
    Assistant,
}

impl MessageRole {
    /// Label used when rendering a transcript
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "Assistant",
        }
    }
}

/// A single entry in the conversation history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Whether this entry was written by the assistant
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Body of `POST /api/chat`
///
/// Built fresh for every submission and never stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// History snapshot taken at submission time
    pub conversation_history: Vec<ChatMessage>,
    /// The message being submitted
    pub current_user_message: String,
    /// Optional system prompt (backend default applies when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Optional model identifier (backend default applies when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Credential forwarded to the backend
    pub api_key: String,
}

impl std::fmt::Debug for ChatRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatRequest")
            .field("conversation_history", &self.conversation_history)
            .field("current_user_message", &self.current_user_message)
            .field("system_message", &self.system_message)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

// Keep the key out of logs.
impl ChatRequest {
    /// A log-safe one-line summary of the request
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} history entries, model={}, api_key={} chars",
            self.conversation_history.len(),
            self.model.as_deref().unwrap_or("<default>"),
            self.api_key.len()
        )
    }
}

/// Health payload, passed through from the upstream untouched
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthStatus(pub serde_json::Value);

impl HealthStatus {
    /// The upstream's `status` field, if it reported one
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(serde_json::Value::as_str)
    }
}

/// Result of `POST /api/upload-pdf`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Human-readable outcome
    #[serde(default)]
    pub message: Option<String>,
    /// Name the backend stored the file under
    #[serde(default)]
    pub filename: Option<String>,
    /// Size of the stored file in bytes
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl UploadReceipt {
    /// Whether the backend returned anything a user can act on
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.message.is_some() || self.filename.is_some() || self.file_size.is_some()
    }

    /// One-line status for display
    #[must_use]
    pub fn describe(&self) -> String {
        match (&self.message, &self.filename, self.file_size) {
            (Some(message), _, _) => message.clone(),
            (None, Some(name), Some(size)) => format!("Uploaded {name} ({size} bytes)"),
            (None, Some(name), None) => format!("Uploaded {name}"),
            (None, None, Some(size)) => format!("Uploaded {size} bytes"),
            (None, None, None) => "Upload finished".to_string(),
        }
    }
}

/// Error payload returned by the proxy
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Generic, client-safe description
    pub error: String,
}

impl ErrorBody {
    /// Create an error body
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
