//! Relay Proxy - Pass-Through HTTP Forwarder for relay-chat
//!
//! Sits between relay-chat clients and the chat backend. Every route takes
//! the inbound body as opaque bytes, forwards it to the same path on the
//! upstream, and relays the answer back without buffering or rewriting it.
//!
//! # Routes
//!
//! ```text
//! client                    relay-proxy                     upstream
//!   │  POST /api/chat          │  POST <upstream>/api/chat      │
//!   │ ───────────────────────► │ ─────────────────────────────► │
//!   │ ◄─ text/plain chunks ─── │ ◄──── streamed body ────────── │
//!   │  GET /api/health         │  GET <upstream>/api/health     │
//!   │  POST /api/upload-pdf    │  POST <upstream>/api/upload-pdf│
//! ```
//!
//! # Failures
//!
//! Unreachable upstreams, timeouts and non-success statuses are logged with
//! full detail and answered with `500 {"error": "..."}` carrying a fixed,
//! route-specific message. Upstream bodies never reach the client on error.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod routes;
pub mod server;
pub mod upstream;

pub use routes::{router, ProxyError, ProxyState, Route};
pub use server::{serve, serve_listener};
pub use upstream::Upstream;
