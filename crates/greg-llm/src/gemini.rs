use async_trait::async_trait;
use greg_core::Result;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::http;
use crate::provider::*;

/// Google Gemini `generateContent` provider.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn build_request_body(&self, request: &LlmRequest) -> Value {
        json!({
            "system_instruction": { "parts": [{ "text": request.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": request.user }] }],
            "generationConfig": { "maxOutputTokens": request.max_tokens },
        })
    }

    fn post(&self, url: String, body: &Value) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(body)
    }
}

/// Text of the first answer part (thought parts skipped).
pub(crate) fn extract_text(data: &Value) -> String {
    data["candidates"][0]["content"]["parts"]
        .as_array()
        .and_then(|parts| parts.iter().find(|p| p["thought"] != json!(true)))
        .and_then(|p| p["text"].as_str())
        .unwrap_or_default()
        .to_string()
}

/// Map one streamed `GenerateContentResponse` to chunks. Parts flagged
/// `thought: true` are reasoning; a `finishReason` ends the stream.
pub(crate) fn classify_event(event: &Value) -> Vec<StreamChunk> {
    let candidate = &event["candidates"][0];
    let mut chunks = Vec::new();

    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            let Some(text) = part["text"].as_str().filter(|t| !t.is_empty()) else {
                continue;
            };
            if part["thought"] == json!(true) {
                chunks.push(StreamChunk::Reasoning(text.to_string()));
            } else {
                chunks.push(StreamChunk::Content(text.to_string()));
            }
        }
    }
    if candidate["finishReason"].is_string() {
        chunks.push(StreamChunk::Done);
    }
    chunks
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        debug!(model = %self.model, "sending Gemini API request");
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let data = http::post_json(self.post(url, &self.build_request_body(request))).await?;
        Ok(extract_text(&data))
    }

    async fn stream(
        &self,
        request: &LlmRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>> {
        debug!(model = %self.model, "starting Gemini stream");
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let mut body = self.build_request_body(request);
        body["generationConfig"]["thinkingConfig"] = json!({ "includeThoughts": true });
        Ok(http::spawn_sse(self.post(url, &body), classify_event))
    }
}
