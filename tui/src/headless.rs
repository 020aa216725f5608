//! Headless Modes
//!
//! One-shot operations for scripts and pipes: send a single prompt and
//! stream the reply to a writer, report proxy health, or upload a PDF.
//! They share the session and transport the full-screen UI uses.

use std::path::Path;
use std::sync::Arc;

use relay_core::{spawn_exchange, ChatSession, ChatTransport, PdfUpload, RelayError, SessionEvent};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Send `prompt` and stream the reply into `out`
///
/// Only the new part of each cumulative chunk is written, so `out` receives
/// the reply exactly once. The session records the exchange either way.
///
/// # Errors
///
/// Fails with the exchange's error message when the reply cannot be
/// obtained, or when writing to `out` fails.
pub async fn run_prompt<W>(
    transport: Arc<dyn ChatTransport>,
    session: &mut ChatSession,
    prompt: &str,
    out: &mut W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let Some(request) = session.submit(prompt) else {
        anyhow::bail!("Nothing to send");
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let exchange = spawn_exchange(transport, request, events_tx);

    let mut printed = 0;
    let mut failure = None;
    while let Some(event) = events_rx.recv().await {
        match &event {
            SessionEvent::Chunk(full) => {
                if let Some(delta) = full.get(printed..) {
                    out.write_all(delta.as_bytes()).await?;
                    out.flush().await?;
                }
                printed = full.len();
            }
            SessionEvent::Complete => {}
            SessionEvent::Failed(message) => failure = Some(message.clone()),
        }
        session.apply(event);
        if !session.is_streaming() {
            break;
        }
    }
    exchange.await?;

    if let Some(message) = failure {
        anyhow::bail!(message);
    }
    if printed > 0 {
        out.write_all(b"\n").await?;
        out.flush().await?;
    }
    Ok(())
}

/// Write the proxy's health report to `out`
///
/// # Errors
///
/// Fails when the proxy cannot be reached or reports an error.
pub async fn print_health<W>(transport: &dyn ChatTransport, out: &mut W) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let health = transport.health().await?;
    let pretty = serde_json::to_string_pretty(&health.0)?;
    out.write_all(pretty.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

/// Upload the PDF at `path` and write the outcome to `out`
///
/// # Errors
///
/// Fails when the file cannot be read or the upload is rejected. The
/// message is also written to `out` as `Upload failed: ...`.
pub async fn upload_file<W>(
    transport: &dyn ChatTransport,
    path: &Path,
    api_key: &str,
    out: &mut W,
) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let result = read_upload(path, api_key).await;
    let result = match result {
        Ok(upload) => transport.upload_pdf(upload).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(receipt) => {
            out.write_all(receipt.describe().as_bytes()).await?;
            out.write_all(b"\n").await?;
            out.flush().await?;
            Ok(())
        }
        Err(e) => {
            let line = format!("Upload failed: {e}\n");
            out.write_all(line.as_bytes()).await?;
            out.flush().await?;
            Err(e.into())
        }
    }
}

async fn read_upload(path: &Path, api_key: &str) -> Result<PdfUpload, RelayError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| RelayError::Upload(format!("cannot read {}: {e}", path.display())))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload.pdf".to_string(), |n| n.to_string_lossy().into_owned());

    tracing::debug!(file = %file_name, bytes = bytes.len(), "Uploading PDF");
    Ok(PdfUpload {
        file_name,
        bytes,
        api_key: api_key.to_string(),
    })
}
