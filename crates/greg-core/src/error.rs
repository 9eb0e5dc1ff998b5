use thiserror::Error;

/// Unified error type for the entire greg workspace.
#[derive(Error, Debug)]
pub enum GregError {
    // ── Config errors ──────────────────────────────────────────
    #[error("{0}")]
    Config(String),

    // ── Provider errors ────────────────────────────────────────
    /// Transport failure, non-2xx status or a vendor error payload.
    #[error("{0}")]
    Provider(String),

    /// On-device bridge could not be built or exited unsuccessfully.
    #[error("{0}")]
    Bridge(String),

    #[error("no command generated")]
    EmptyGeneration,

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl GregError {
    /// Whether re-running setup is likely to fix this error.
    ///
    /// This is a substring heuristic over the rendered message (`auth`, `key`,
    /// `401`, `unavailable`), not a typed error code. Vendors phrase
    /// credential failures differently, so the message text is all there is.
    pub fn needs_reconfiguration(&self) -> bool {
        message_suggests_setup(&self.to_string())
    }
}

/// Message-level form of [`GregError::needs_reconfiguration`].
pub fn message_suggests_setup(message: &str) -> bool {
    ["auth", "key", "401", "unavailable"]
        .iter()
        .any(|needle| message.contains(needle))
}

pub type Result<T> = std::result::Result<T, GregError>;
