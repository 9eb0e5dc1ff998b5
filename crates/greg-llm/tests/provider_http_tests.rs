#[cfg(test)]
mod tests {
    use greg_llm::anthropic::AnthropicProvider;
    use greg_llm::gemini::GeminiProvider;
    use greg_llm::openai::OpenAiProvider;
    use greg_llm::{LlmProvider, LlmRequest, StreamChunk};
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> LlmRequest {
        LlmRequest::new("You are Greg", "list all files", 1024)
    }

    async fn collect(provider: &dyn LlmProvider) -> Vec<StreamChunk> {
        let mut rx = provider.stream(&request()).await.unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = rx.recv().await {
            chunks.push(chunk);
        }
        chunks
    }

    // ── Anthropic ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_anthropic_complete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "sk-ant")
                    .header("anthropic-version", "2023-06-01")
                    .json_body_includes(json!({"system": "You are Greg", "max_tokens": 1024}).to_string());
                then.status(200).json_body(json!({
                    "content": [{"type": "text", "text": "ls -la"}],
                    "stop_reason": "end_turn"
                }));
            })
            .await;

        let provider = AnthropicProvider::new("sk-ant", "claude-sonnet-4-20250514")
            .with_base_url(server.url("/v1"));
        assert_eq!(provider.complete(&request()).await.unwrap(), "ls -la");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_anthropic_auth_failure_carries_vendor_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(401).json_body(json!({
                    "type": "error",
                    "error": {"type": "authentication_error", "message": "invalid x-api-key"}
                }));
            })
            .await;

        let provider = AnthropicProvider::new("bad", "m").with_base_url(server.url("/v1"));
        let err = provider.complete(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid x-api-key");
        assert!(err.needs_reconfiguration());
    }

    #[tokio::test]
    async fn test_anthropic_stream_classifies_thinking_and_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .json_body_includes(json!({"stream": true}).to_string());
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(concat!(
                        "event: message_start\n",
                        "data: {\"type\":\"message_start\",\"message\":{}}\n\n",
                        "event: content_block_delta\n",
                        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"thinking_delta\",\"thinking\":\"user wants files\"}}\n\n",
                        "event: content_block_delta\n",
                        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"text_delta\",\"text\":\"ls \"}}\n\n",
                        "event: content_block_delta\n",
                        "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"text_delta\",\"text\":\"-la\"}}\n\n",
                        "event: message_delta\n",
                        "data: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n",
                        "event: message_stop\n",
                        "data: {\"type\":\"message_stop\"}\n\n"
                    ));
            })
            .await;

        let provider = AnthropicProvider::new("k", "m").with_base_url(server.url("/v1"));
        assert_eq!(
            collect(&provider).await,
            vec![
                StreamChunk::Reasoning("user wants files".into()),
                StreamChunk::Content("ls ".into()),
                StreamChunk::Content("-la".into()),
                StreamChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_anthropic_stream_error_event_is_terminal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(concat!(
                        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"ls\"}}\n\n",
                        "event: error\n",
                        "data: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n",
                        "data: {\"type\":\"content_block_delta\",\"delta\":{\"type\":\"text_delta\",\"text\":\"ignored\"}}\n\n"
                    ));
            })
            .await;

        let provider = AnthropicProvider::new("k", "m").with_base_url(server.url("/v1"));
        assert_eq!(
            collect(&provider).await,
            vec![
                StreamChunk::Content("ls".into()),
                StreamChunk::Error("Overloaded".into()),
            ]
        );
    }

    // ── OpenAI ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_openai_complete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer sk-proj");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "pwd"}}]
                }));
            })
            .await;

        let provider = OpenAiProvider::new("sk-proj", "gpt-4o-mini").with_base_url(server.url("/v1"));
        assert_eq!(provider.complete(&request()).await.unwrap(), "pwd");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openai_stream_done_sent_once() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .json_body_includes(json!({"stream": true}).to_string());
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(concat!(
                        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
                        "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"hmm\"}}]}\n\n",
                        "data: {\"choices\":[{\"delta\":{\"content\":\"du \"}}]}\n\n",
                        "data: {\"choices\":[{\"delta\":{\"content\":\"-sh\"},\"finish_reason\":\"stop\"}]}\n\n",
                        "data: [DONE]\n\n"
                    ));
            })
            .await;

        let provider = OpenAiProvider::new("k", "m").with_base_url(server.url("/v1"));
        assert_eq!(
            collect(&provider).await,
            vec![
                StreamChunk::Reasoning("hmm".into()),
                StreamChunk::Content("du ".into()),
                StreamChunk::Content("-sh".into()),
                StreamChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_without_terminal_marker_ends_with_done() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body("data: {\"choices\":[{\"delta\":{\"content\":\"ls\"}}]}\n\n");
            })
            .await;

        let provider = OpenAiProvider::new("k", "m").with_base_url(server.url("/v1"));
        assert_eq!(
            collect(&provider).await,
            vec![StreamChunk::Content("ls".into()), StreamChunk::Done]
        );
    }

    #[tokio::test]
    async fn test_openai_stream_http_error_becomes_error_chunk() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401).json_body(json!({
                    "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
                }));
            })
            .await;

        let provider = OpenAiProvider::new("k", "m").with_base_url(server.url("/v1"));
        assert_eq!(
            collect(&provider).await,
            vec![StreamChunk::Error("Incorrect API key provided".into())]
        );
    }

    #[tokio::test]
    async fn test_vendor_error_in_success_body() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .json_body(json!({"error": {"message": "model not found"}}));
            })
            .await;

        let provider = OpenAiProvider::new("k", "m").with_base_url(server.url("/v1"));
        let err = provider.complete(&request()).await.unwrap_err();
        assert_eq!(err.to_string(), "model not found");
    }

    // ── Gemini ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_gemini_complete() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent")
                    .header("x-goog-api-key", "AIza");
                then.status(200).json_body(json!({
                    "candidates": [{"content": {"parts": [{"text": "tree -L 2"}]}}]
                }));
            })
            .await;

        let provider =
            GeminiProvider::new("AIza", "gemini-2.5-flash").with_base_url(server.url("/v1beta"));
        assert_eq!(provider.complete(&request()).await.unwrap(), "tree -L 2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gemini_stream_thoughts_and_finish() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:streamGenerateContent")
                    .query_param("alt", "sse");
                then.status(200)
                    .header("content-type", "text/event-stream")
                    .body(concat!(
                        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Looking at the dir\",\"thought\":true}]}}]}\n\n",
                        "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"ls\"}]},\"finishReason\":\"STOP\"}]}\n\n"
                    ));
            })
            .await;

        let provider =
            GeminiProvider::new("k", "gemini-2.5-flash").with_base_url(server.url("/v1beta"));
        assert_eq!(
            collect(&provider).await,
            vec![
                StreamChunk::Reasoning("Looking at the dir".into()),
                StreamChunk::Content("ls".into()),
                StreamChunk::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_gemini_bad_key() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-2.5-flash:generateContent");
                then.status(400).json_body(json!({
                    "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
                }));
            })
            .await;

        let provider =
            GeminiProvider::new("bad", "gemini-2.5-flash").with_base_url(server.url("/v1beta"));
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(err.to_string().starts_with("API key not valid"));
        assert!(err.needs_reconfiguration());
    }

    // ── Transport ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_unreachable_host_is_provider_error() {
        let provider = OpenAiProvider::new("k", "m").with_base_url("http://127.0.0.1:1");
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, greg_core::GregError::Provider(_)));
    }
}
