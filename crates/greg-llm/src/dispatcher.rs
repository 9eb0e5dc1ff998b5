use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use greg_config::{GregConfig, Paths, ProviderKind};
use greg_core::{GregError, Profile, Result};

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::on_device::OnDeviceProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{LlmProvider, LlmRequest, StreamChunk};

/// Token bound for one-shot command generation.
pub const COMMAND_MAX_TOKENS: u32 = 1024;
/// Token bound for interactive session answers.
pub const SESSION_MAX_TOKENS: u32 = 4096;
/// Token bound for the skill-selection round trip.
pub const SKILL_SELECTION_MAX_TOKENS: u32 = 100;

/// Routes requests to the backend named in the config.
///
/// Exactly one round trip per call. No retries, no failover.
#[derive(Clone)]
pub struct Dispatcher {
    kind: ProviderKind,
    provider: Arc<dyn LlmProvider>,
}

impl Dispatcher {
    /// Build the provider for `config`.
    pub fn from_config(config: &GregConfig, paths: &Paths) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> = match config.provider {
            ProviderKind::OnDevice => Arc::new(OnDeviceProvider::new(paths)),
            ProviderKind::Anthropic => {
                let (key, model) = remote_credentials(config)?;
                Arc::new(AnthropicProvider::new(key, model))
            }
            ProviderKind::OpenAi => {
                let (key, model) = remote_credentials(config)?;
                Arc::new(OpenAiProvider::new(key, model))
            }
            ProviderKind::Gemini => {
                let (key, model) = remote_credentials(config)?;
                Arc::new(GeminiProvider::new(key, model))
            }
        };
        info!(provider = provider.name(), "dispatcher ready");
        Ok(Self::with_provider(config.provider, provider))
    }

    /// Wrap an already-built provider.
    pub fn with_provider(kind: ProviderKind, provider: Arc<dyn LlmProvider>) -> Self {
        Self { kind, provider }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Truncation profile for the terminal context.
    pub fn profile(&self) -> Profile {
        self.kind.profile()
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Send one request and wait for the whole answer.
    pub async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        debug!(
            provider = self.provider.name(),
            max_tokens,
            system_len = system.len(),
            "dispatching request"
        );
        self.provider
            .complete(&LlmRequest::new(system, user, max_tokens))
            .await
    }

    /// Send one request and receive the answer as ordered chunks.
    pub async fn stream(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<mpsc::Receiver<StreamChunk>> {
        debug!(provider = self.provider.name(), max_tokens, "dispatching stream");
        self.provider
            .stream(&LlmRequest::new(system, user, max_tokens))
            .await
    }
}

fn remote_credentials(config: &GregConfig) -> Result<(String, String)> {
    let key = config.api_key().ok_or_else(|| {
        GregError::Config("No API key configured. Run `greg --setup` to configure.".into())
    })?;
    let model = config.resolved_model().ok_or_else(|| {
        GregError::Config(format!("no model configured for {}", config.provider))
    })?;
    Ok((key.to_string(), model.to_string()))
}
