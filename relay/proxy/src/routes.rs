//! Route Handlers
//!
//! Three pass-through routes. Each forwards to the same path upstream and
//! maps every failure to a [`ProxyError`], which logs the detail and answers
//! with a fixed 500 body.

use std::fmt;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay_core::{ErrorBody, HealthStatus, RelayConfig, RelayError};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::upstream::Upstream;

/// Shared state for all handlers
#[derive(Clone, Debug)]
pub struct ProxyState {
    /// Upstream client
    pub upstream: Arc<Upstream>,
    /// Largest inbound body accepted, in bytes
    pub max_body_bytes: usize,
}

impl ProxyState {
    /// Build state from a resolved configuration
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ClientSetup`] if the upstream client cannot be built.
    pub fn from_config(config: &RelayConfig) -> Result<Self, RelayError> {
        Ok(Self {
            upstream: Arc::new(Upstream::from_config(config)?),
            max_body_bytes: config.max_body_bytes,
        })
    }
}

/// The proxied routes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// `POST /api/chat`
    Chat,
    /// `GET /api/health`
    Health,
    /// `POST /api/upload-pdf`
    UploadPdf,
}

impl Route {
    /// Path on both the proxy and the upstream
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Chat => "/api/chat",
            Self::Health => "/api/health",
            Self::UploadPdf => "/api/upload-pdf",
        }
    }

    /// Client-visible message when this route fails
    #[must_use]
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Chat => "Failed to process request",
            Self::Health => "Failed to check API health",
            Self::UploadPdf => "Failed to upload file",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A failed proxied request
#[derive(Debug, Error)]
#[error("{route} failed: {source}")]
pub struct ProxyError {
    /// Route that failed
    pub route: Route,
    /// What went wrong upstream
    #[source]
    pub source: RelayError,
}

impl ProxyError {
    /// Attach a route to an upstream failure
    #[must_use]
    pub fn new(route: Route, source: RelayError) -> Self {
        Self { route, source }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(
            route = %self.route,
            upstream_status = ?self.source.upstream_status(),
            error = %self.source,
            "Proxied request failed"
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(self.route.failure_message())),
        )
            .into_response()
    }
}

/// Build the proxy router
pub fn router(state: ProxyState) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route(Route::Chat.path(), post(chat))
        .route(Route::Health.path(), get(health))
        .route(Route::UploadPdf.path(), post(upload_pdf))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Relay a chat request and stream the reply back as it arrives
async fn chat(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let upstream = state
        .upstream
        .forward(
            Route::Chat.path(),
            headers.get(header::CONTENT_TYPE).cloned(),
            body,
        )
        .await
        .map_err(|e| ProxyError::new(Route::Chat, e))?;

    tracing::debug!(status = %upstream.status(), "Streaming upstream reply");

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}

/// Pass the upstream health payload through
async fn health(State(state): State<ProxyState>) -> Result<Json<HealthStatus>, ProxyError> {
    let fail = |e: RelayError| ProxyError::new(Route::Health, e);

    let response = state.upstream.get(Route::Health.path()).await.map_err(fail)?;
    let status = response
        .json::<HealthStatus>()
        .await
        .map_err(|e| fail(RelayError::InvalidResponse(e.to_string())))?;
    Ok(Json(status))
}

/// Relay a multipart upload verbatim and pass the JSON answer through
async fn upload_pdf(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ProxyError> {
    let fail = |e: RelayError| ProxyError::new(Route::UploadPdf, e);

    let response = state
        .upstream
        .forward(
            Route::UploadPdf.path(),
            headers.get(header::CONTENT_TYPE).cloned(),
            body,
        )
        .await
        .map_err(fail)?;
    let receipt = response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| fail(RelayError::InvalidResponse(e.to_string())))?;

    tracing::info!(receipt = %receipt, "Upload relayed");
    Ok(Json(receipt))
}
