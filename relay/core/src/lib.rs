//! Relay Core - Conversation State and Streaming for relay-chat
//!
//! This crate holds everything a relay-chat surface needs that is not drawing
//! pixels or serving sockets: the wire types shared with the proxy, the
//! conversation state machine, the incremental stream consumer and the HTTP
//! transport that talks to the proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Surface (TUI)                        │
//! │        keyboard ──► ChatSession ◄── SessionEvent (Chunk,     │
//! │                         │             Complete, Failed)      │
//! └─────────────────────────┼────────────────────────▲───────────┘
//!                           │ ChatRequest            │
//! ┌─────────────────────────▼────────────────────────┼───────────┐
//! │  exchange::reply ──► ChatTransport ──► StreamConsumer        │
//! │                      (HttpTransport)   (UTF-8, cumulative)   │
//! └─────────────────────────┬────────────────────────────────────┘
//!                           │ POST /api/chat
//!                     relay-proxy ──► upstream backend
//! ```
//!
//! # Key Types
//!
//! - [`ChatSession`]: the Idle/Streaming state machine owning the history
//! - [`StreamConsumer`]: decodes a byte stream into cumulative text
//! - [`ChatTransport`]: seam between the session driver and the network
//! - [`RelayError`]: every failure the client or proxy can surface
//! - [`RelayConfig`]: layered configuration (defaults, TOML, env, CLI)
//!
//! # No Surface Dependencies
//!
//! This crate has no dependency on ratatui, crossterm or axum. It can drive
//! a terminal UI, a headless one-shot prompt, or a test harness.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod error;
pub mod exchange;
pub mod messages;
pub mod session;
pub mod stream;

pub use backend::{ByteStream, ChatTransport, HttpTransport, PdfUpload};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, RelayConfig, RelayToml,
};
pub use error::RelayError;
pub use exchange::{reply, run_exchange, spawn_exchange, ExchangeOutcome};
pub use messages::{
    ChatMessage, ChatRequest, ErrorBody, HealthStatus, MessageRole, UploadReceipt, DEFAULT_MODEL,
    KNOWN_MODELS,
};
pub use session::{ChatSession, SessionEvent, SessionState, Transition};
pub use stream::{ChannelObserver, StreamConsumer, StreamObserver, StreamStats, Utf8Decoder};
