//! Mock LLM provider for deterministic testing.
//!
//! Returns pre-configured responses without making any HTTP calls or
//! spawning any subprocess.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::provider::*;
use greg_core::{GregError, Result};

/// How a recorded request was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Complete,
    Stream,
}

/// A pre-configured response from the mock provider.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    pub text: String,
    /// Explicit stream script. When empty, streaming sends `text` as one
    /// content chunk followed by `Done`.
    pub chunks: Vec<StreamChunk>,
    /// If set, the provider will return this error instead.
    pub error: Option<String>,
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Default::default()
        }
    }

    pub fn chunks(chunks: Vec<StreamChunk>) -> Self {
        let text = chunks
            .iter()
            .filter_map(|c| match c {
                StreamChunk::Content(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        Self {
            text,
            chunks,
            error: None,
        }
    }
}

/// A mock LLM provider that returns pre-configured responses.
///
/// # Example
/// ```
/// use greg_llm::mock::MockProvider;
/// let provider = MockProvider::new("test")
///     .with_response("ls -la");
/// ```
pub struct MockProvider {
    responses: Arc<Mutex<Vec<MockResponse>>>,
    requests: Arc<Mutex<Vec<(CallMode, LlmRequest)>>>,
    name: String,
}

impl MockProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![])),
            requests: Arc::new(Mutex::new(vec![])),
            name: name.into(),
        }
    }

    /// Queue a simple text response.
    pub fn with_response(self, text: &str) -> Self {
        self.responses.lock().push(MockResponse::text(text));
        self
    }

    /// Queue an error response.
    pub fn with_error(self, error: &str) -> Self {
        self.responses.lock().push(MockResponse::error(error));
        self
    }

    /// Queue a scripted stream.
    pub fn with_chunks(self, chunks: Vec<StreamChunk>) -> Self {
        self.responses.lock().push(MockResponse::chunks(chunks));
        self
    }

    /// Queue a fully custom response.
    pub fn with_mock_response(self, resp: MockResponse) -> Self {
        self.responses.lock().push(resp);
        self
    }

    /// Every request received so far, in order.
    pub fn recorded_requests(&self) -> Vec<(CallMode, LlmRequest)> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Pop the next queued response, or a placeholder when the queue is empty.
    fn next_response(&self) -> MockResponse {
        let mut responses = self.responses.lock();
        if responses.is_empty() {
            MockResponse::text("(mock: no more queued responses)")
        } else {
            responses.remove(0)
        }
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        self.requests
            .lock()
            .push((CallMode::Complete, request.clone()));
        let resp = self.next_response();
        match resp.error {
            Some(err) => Err(GregError::Provider(err)),
            None => Ok(resp.text),
        }
    }

    async fn stream(&self, request: &LlmRequest) -> Result<mpsc::Receiver<StreamChunk>> {
        self.requests.lock().push((CallMode::Stream, request.clone()));
        let resp = self.next_response();

        let chunks = if let Some(err) = resp.error {
            vec![StreamChunk::Error(err)]
        } else if resp.chunks.is_empty() {
            vec![StreamChunk::Content(resp.text), StreamChunk::Done]
        } else {
            resp.chunks
        };

        let (tx, rx) = mpsc::channel(chunks.len().max(1));
        for chunk in chunks {
            let _ = tx.send(chunk).await;
        }
        Ok(rx)
    }
}
