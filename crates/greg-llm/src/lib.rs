//! # greg-llm
//!
//! Uniform call surface over greg's backends. Every provider supports a
//! blocking completion and a streamed completion that yields typed
//! [`StreamChunk`]s (reasoning, content, done, error).

pub mod anthropic;
pub mod dispatcher;
pub mod gemini;
mod http;
pub mod mock;
pub mod on_device;
pub mod openai;
pub mod provider;
pub mod sse;
pub mod text;

pub use dispatcher::Dispatcher;
pub use mock::MockProvider;
pub use on_device::{Availability, OnDeviceProvider};
pub use provider::{LlmProvider, LlmRequest, StreamChunk};
pub use text::strip_code_fences;
