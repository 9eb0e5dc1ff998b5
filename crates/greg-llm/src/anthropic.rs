use async_trait::async_trait;
use greg_core::Result;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::http;
use crate::provider::*;

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://api.anthropic.com/v1".into(),
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
            "system": request.system,
            "messages": [{ "role": "user", "content": request.user }],
        })
    }

    fn post(&self, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(body)
    }
}

/// First `text` block of a Messages response.
pub(crate) fn extract_text(data: &Value) -> String {
    data["content"]
        .as_array()
        .and_then(|blocks| blocks.iter().find(|b| b["type"] == "text"))
        .and_then(|b| b["text"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Map one Messages streaming event to chunks.
pub(crate) fn classify_event(event: &Value) -> Vec<StreamChunk> {
    match event["type"].as_str() {
        Some("content_block_delta") => {
            let delta = &event["delta"];
            match delta["type"].as_str() {
                Some("text_delta") => delta["text"]
                    .as_str()
                    .map(|t| vec![StreamChunk::Content(t.to_string())])
                    .unwrap_or_default(),
                Some("thinking_delta") => delta["thinking"]
                    .as_str()
                    .map(|t| vec![StreamChunk::Reasoning(t.to_string())])
                    .unwrap_or_default(),
                _ => vec![],
            }
        }
        Some("message_stop") => vec![StreamChunk::Done],
        Some("error") => {
            let msg = event["error"]["message"].as_str().unwrap_or("unknown error");
            vec![StreamChunk::Error(msg.to_string())]
        }
        _ => vec![],
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        debug!(model = %self.model, "sending Anthropic API request");
        let data = http::post_json(self.post(&self.build_request_body(request))).await?;
        Ok(extract_text(&data))
    }

    async fn stream(
        &self,
        request: &LlmRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>> {
        debug!(model = %self.model, "starting Anthropic stream");
        let mut body = self.build_request_body(request);
        body["stream"] = json!(true);
        Ok(http::spawn_sse(self.post(&body), classify_event))
    }
}
