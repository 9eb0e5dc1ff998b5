use async_trait::async_trait;
use greg_core::Result;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::http;
use crate::provider::*;

/// OpenAI Chat Completions provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request_body(&self, request: &LlmRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
        })
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(body)
    }
}

pub(crate) fn extract_text(data: &Value) -> String {
    data["choices"][0]["message"]["content"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

/// Map one streamed completion chunk to chunks. Reasoning models report
/// their thinking as `reasoning_content` (or `reasoning`) on the delta.
pub(crate) fn classify_event(event: &Value) -> Vec<StreamChunk> {
    let choice = &event["choices"][0];
    let delta = &choice["delta"];
    let mut chunks = Vec::new();

    let reasoning = delta["reasoning_content"]
        .as_str()
        .or_else(|| delta["reasoning"].as_str());
    if let Some(text) = reasoning.filter(|t| !t.is_empty()) {
        chunks.push(StreamChunk::Reasoning(text.to_string()));
    }
    if let Some(text) = delta["content"].as_str().filter(|t| !t.is_empty()) {
        chunks.push(StreamChunk::Content(text.to_string()));
    }
    if choice["finish_reason"].is_string() {
        chunks.push(StreamChunk::Done);
    }
    chunks
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        debug!(model = %self.model, "sending OpenAI API request");
        let data = http::post_json(self.post(&self.build_request_body(request))).await?;
        Ok(extract_text(&data))
    }

    async fn stream(
        &self,
        request: &LlmRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>> {
        debug!(model = %self.model, "starting OpenAI stream");
        let mut body = self.build_request_body(request);
        body["stream"] = json!(true);
        Ok(http::spawn_sse(self.post(&body), classify_event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let provider = OpenAiProvider::new("k", "gpt-4o-mini");
        let body = provider.build_request_body(&LlmRequest::new("sys", "u", 100));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
    }

    #[test]
    fn test_extract_text() {
        let data = json!({"choices": [{"message": {"role": "assistant", "content": "pwd"}}]});
        assert_eq!(extract_text(&data), "pwd");
        assert_eq!(extract_text(&json!({"choices": []})), "");
    }

    #[test]
    fn test_classify_content_and_reasoning() {
        let event = json!({"choices": [{"delta": {"content": "ls"}, "finish_reason": null}]});
        assert_eq!(classify_event(&event), vec![StreamChunk::Content("ls".into())]);

        let event = json!({"choices": [{"delta": {"reasoning_content": "think"}}]});
        assert_eq!(classify_event(&event), vec![StreamChunk::Reasoning("think".into())]);
    }

    #[test]
    fn test_finish_reason_ends_stream_after_last_delta() {
        let event = json!({"choices": [{"delta": {"content": "!"}, "finish_reason": "stop"}]});
        assert_eq!(
            classify_event(&event),
            vec![StreamChunk::Content("!".into()), StreamChunk::Done]
        );
    }

    #[test]
    fn test_role_only_delta_is_ignored() {
        let event = json!({"choices": [{"delta": {"role": "assistant", "content": ""}}]});
        assert!(classify_event(&event).is_empty());
    }
}
