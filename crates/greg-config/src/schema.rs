use greg_core::Profile;
use serde::{Deserialize, Serialize};

/// Which backend turns prompts into commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// Apple on-device model, reached through a local subprocess bridge.
    #[serde(rename = "afm", alias = "on-device")]
    OnDevice,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "gemini")]
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OnDevice,
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
    ];

    /// Human label used by the setup wizard.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::OnDevice => "Apple Intelligence (on-device, free)",
            ProviderKind::Anthropic => "Anthropic (Claude)",
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Google Gemini",
        }
    }

    pub fn default_model(self) -> Option<&'static str> {
        match self {
            ProviderKind::OnDevice => None,
            ProviderKind::Anthropic => Some("claude-sonnet-4-20250514"),
            ProviderKind::OpenAi => Some("gpt-4o-mini"),
            ProviderKind::Gemini => Some("gemini-2.5-flash"),
        }
    }

    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::OnDevice)
    }

    /// Environment variable consulted when the config file has no key.
    pub fn api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderKind::OnDevice => None,
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
        }
    }

    pub fn profile(self) -> Profile {
        match self {
            ProviderKind::OnDevice => Profile::OnDevice,
            _ => Profile::Cloud,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ProviderKind::OnDevice => "afm",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        };
        f.write_str(tag)
    }
}

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GregConfig {
    pub provider: ProviderKind,
    #[serde(rename = "apiKey", default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GregConfig {
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            api_key: None,
            model: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Configured model, or the vendor default.
    pub fn resolved_model(&self) -> Option<&str> {
        self.model
            .as_deref()
            .filter(|m| !m.is_empty())
            .or_else(|| self.provider.default_model())
    }

    /// Key for remote vendors. Empty strings count as missing.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        if self.provider.requires_api_key() && self.api_key().is_none() {
            let hint = match self.provider.api_key_env() {
                Some(var) => format!("Run `greg --setup` or export {var}"),
                None => "Run `greg --setup`".to_string(),
            };
            warnings.push(ConfigWarning {
                field: "apiKey".into(),
                message: format!("an API key is required for {}", self.provider),
                severity: WarningSeverity::Error,
                hint: Some(hint),
            });
        }

        if !self.provider.requires_api_key() && self.api_key.is_some() {
            warnings.push(ConfigWarning {
                field: "apiKey".into(),
                message: "ignored for the on-device provider".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        if self.provider == ProviderKind::OnDevice && self.model.is_some() {
            warnings.push(ConfigWarning {
                field: "model".into(),
                message: "ignored for the on-device provider".into(),
                severity: WarningSeverity::Warning,
                hint: None,
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}
