//! Exchange Driver
//!
//! Runs one submission end to end: the session's request goes out through a
//! [`ChatTransport`], the reply is consumed chunk by chunk, and every outcome
//! lands back in the session as a transition. Failures never escape as
//! errors; they become an `Error: ...` entry in the transcript.
//!
//! Two drivers are provided:
//!
//! - [`run_exchange`] borrows the session for the whole exchange. Suited to
//!   headless use where nothing else needs the session meanwhile.
//! - [`spawn_exchange`] runs the network half in a task and reports
//!   [`SessionEvent`]s over a channel, so an event loop can keep owning the
//!   session and apply events in arrival order.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::ChatTransport;
use crate::error::RelayError;
use crate::messages::ChatRequest;
use crate::session::{ChatSession, SessionEvent};
use crate::stream::{StreamConsumer, StreamObserver};

/// How an exchange ended
#[derive(Debug)]
pub enum ExchangeOutcome {
    /// The session refused the submission (blank text or already streaming)
    Rejected,
    /// The reply streamed to completion
    Completed {
        /// Full reply text
        text: String,
    },
    /// The exchange failed; the transcript already shows the error
    Failed {
        /// What went wrong
        error: RelayError,
    },
}

impl ExchangeOutcome {
    /// Whether the reply streamed to completion
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Send `request` and stream the reply into `observer`
///
/// # Errors
///
/// Any [`RelayError`] from sending the request or reading the reply.
pub async fn reply<T, O>(
    transport: &T,
    request: &ChatRequest,
    observer: &mut O,
) -> Result<String, RelayError>
where
    T: ChatTransport + ?Sized,
    O: StreamObserver + ?Sized,
{
    let body = transport.send_chat(request).await?;
    StreamConsumer::new().consume(body, observer).await
}

/// Submit `text` and drive the exchange to completion
///
/// `render` is called after every transition, including the initial submit.
pub async fn run_exchange<T, F>(
    session: &mut ChatSession,
    transport: &T,
    text: &str,
    mut render: F,
) -> ExchangeOutcome
where
    T: ChatTransport + ?Sized,
    F: FnMut(&ChatSession),
{
    let Some(request) = session.submit(text) else {
        return ExchangeOutcome::Rejected;
    };
    render(session);

    let result = {
        let mut observer = |full: &str| {
            session.on_chunk(full);
            render(session);
        };
        reply(transport, &request, &mut observer).await
    };

    let outcome = match result {
        Ok(text) => {
            session.on_complete();
            ExchangeOutcome::Completed { text }
        }
        Err(error) => {
            session.on_error(&error.to_string());
            ExchangeOutcome::Failed { error }
        }
    };
    render(session);
    outcome
}

/// Run the network half of an exchange in a background task
///
/// Sends a [`SessionEvent::Chunk`] per chunk, then exactly one of
/// [`SessionEvent::Complete`] or [`SessionEvent::Failed`]. Events are dropped
/// silently if the receiver has gone away.
pub fn spawn_exchange(
    transport: Arc<dyn ChatTransport>,
    request: ChatRequest,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut observer = |full: &str| {
            let _ = events.send(SessionEvent::Chunk(full.to_string()));
        };

        let event = match reply(transport.as_ref(), &request, &mut observer).await {
            Ok(text) => {
                tracing::debug!(
                    transport = transport.name(),
                    chars = text.chars().count(),
                    "Exchange complete"
                );
                SessionEvent::Complete
            }
            Err(e) => {
                tracing::warn!(transport = transport.name(), error = %e, "Exchange failed");
                SessionEvent::Failed(e.to_string())
            }
        };
        let _ = events.send(event);
    })
}
