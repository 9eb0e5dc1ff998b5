use futures::StreamExt;
use greg_core::{GregError, Result};
use reqwest::RequestBuilder;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::provider::StreamChunk;
use crate::sse::SseLineBuffer;

/// Vendor-specific mapping from one decoded SSE event to chunks.
pub(crate) type ClassifyFn = fn(&Value) -> Vec<StreamChunk>;

/// Human message for a failed vendor response: the vendor's
/// `error.message` when present, otherwise status and body.
pub(crate) fn vendor_error(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| error_message(&v))
        .unwrap_or_else(|| format!("HTTP {status}: {}", body.trim()))
}

/// `error.message` (or a bare `error` string) from a vendor payload.
pub(crate) fn error_message(payload: &Value) -> Option<String> {
    // Gemini streams errors as a one-element array.
    let payload = match payload {
        Value::Array(items) => items.first()?,
        other => other,
    };
    match &payload["error"] {
        Value::Object(err) => Some(
            err.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        Value::String(msg) => Some(msg.clone()),
        _ => None,
    }
}

/// POST and decode a single JSON body, mapping transport failures, non-2xx
/// statuses and vendor error payloads to [`GregError::Provider`].
pub(crate) async fn post_json(request: RequestBuilder) -> Result<Value> {
    let resp = request
        .send()
        .await
        .map_err(|e| GregError::Provider(e.to_string()))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| GregError::Provider(e.to_string()))?;

    if !status.is_success() {
        return Err(GregError::Provider(vendor_error(status, &text)));
    }

    let data: Value = serde_json::from_str(&text)
        .map_err(|e| GregError::Provider(format!("invalid response from provider: {e}")))?;

    if let Some(msg) = error_message(&data) {
        return Err(GregError::Provider(msg));
    }
    Ok(data)
}

/// Send a streaming request on a background task and forward classified
/// chunks. Guarantees exactly one terminal chunk, after which the channel
/// closes.
pub(crate) fn spawn_sse(request: RequestBuilder, classify: ClassifyFn) -> mpsc::Receiver<StreamChunk> {
    let (tx, rx) = mpsc::channel(256);

    tokio::spawn(async move {
        let terminal = pump(request, classify, &tx).await;
        let _ = tx.send(terminal).await;
    });

    rx
}

/// Forward non-terminal chunks and return the terminal one.
async fn pump(
    request: RequestBuilder,
    classify: ClassifyFn,
    tx: &mpsc::Sender<StreamChunk>,
) -> StreamChunk {
    let resp = match request.send().await {
        Ok(resp) => resp,
        Err(e) => return StreamChunk::Error(e.to_string()),
    };

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return StreamChunk::Error(vendor_error(status, &text));
    }

    let mut stream = resp.bytes_stream();
    let mut buffer = SseLineBuffer::new();

    while let Some(chunk_result) = stream.next().await {
        let bytes = match chunk_result {
            Ok(bytes) => bytes,
            Err(e) => return StreamChunk::Error(e.to_string()),
        };
        for payload in buffer.push(&bytes) {
            if let Some(terminal) = forward(&payload, classify, tx).await {
                return terminal;
            }
        }
    }
    if let Some(payload) = buffer.finish()
        && let Some(terminal) = forward(&payload, classify, tx).await
    {
        return terminal;
    }

    debug!("stream ended without a terminal event");
    StreamChunk::Done
}

/// Decode one payload. Returns the terminal chunk if the payload ends the
/// stream; non-terminal chunks are sent immediately.
async fn forward(
    payload: &str,
    classify: ClassifyFn,
    tx: &mpsc::Sender<StreamChunk>,
) -> Option<StreamChunk> {
    let event = match serde_json::from_str::<Value>(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "skipping undecodable stream event");
            return None;
        }
    };

    if let Some(msg) = error_message(&event) {
        return Some(StreamChunk::Error(msg));
    }

    for chunk in classify(&event) {
        if chunk.is_terminal() {
            return Some(chunk);
        }
        // Receiver gone: nobody is listening, stop reading.
        if tx.send(chunk).await.is_err() {
            return Some(StreamChunk::Done);
        }
    }
    None
}
