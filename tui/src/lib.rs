//! Relay Chat TUI - Terminal interface for relay-chat
//!
//! A full-screen chat client over [`relay_core::ChatSession`], plus headless
//! one-shot modes for scripts.
//!
//! # Architecture
//!
//! - **App**: event loop, key handling and rendering
//! - **Display**: pure layout helpers (wrapping, scrolling, status bar)
//! - **Headless**: `--prompt`, `--health` and `--upload` modes
//!
//! Exchanges run in background tasks and report back as
//! [`relay_core::SessionEvent`]s, so the terminal stays responsive while a
//! reply streams.

pub mod app;
pub mod display;
pub mod headless;

pub use app::{App, Focus};
