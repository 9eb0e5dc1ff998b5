use async_trait::async_trait;
use greg_core::Result;

/// One prompt pair sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmRequest {
    pub system: String,
    pub user: String,
    /// Upper bound on generated tokens. Ignored by the on-device bridge.
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens,
        }
    }
}

/// A chunk of a streaming response.
///
/// Chunks arrive in emission order. `Done` and `Error` are terminal: the
/// stream is closed right after either is sent, and at most one of them is
/// ever sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Thinking / reasoning text.
    Reasoning(String),
    /// Answer text delta.
    Content(String),
    Done,
    Error(String),
}

impl StreamChunk {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamChunk::Done | StreamChunk::Error(_))
    }
}

/// Trait implemented by each backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Human-readable name, e.g. "Anthropic", "On-device".
    fn name(&self) -> &str;

    /// Send a request and wait for the whole answer.
    async fn complete(&self, request: &LlmRequest) -> Result<String>;

    /// Send a streaming request. Returns a receiver for chunks.
    ///
    /// Failures that happen before the stream starts may be returned as
    /// `Err`; everything after that arrives as [`StreamChunk::Error`].
    async fn stream(
        &self,
        request: &LlmRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>>;
}
