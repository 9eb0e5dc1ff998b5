use async_trait::async_trait;
use greg_config::Paths;
use greg_core::{GregError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::provider::*;

/// Swift source of the bridge, written next to the binary when missing.
pub const BRIDGE_SOURCE: &str = include_str!("../bridge/afm-bridge.swift");

const BUILD_TIMEOUT: Duration = Duration::from_secs(60);
const RUN_TIMEOUT: Duration = Duration::from_secs(60);
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const BUILD_FAILED: &str = "Could not compile AFM bridge. Is Xcode installed?";

/// Serializes bridge builds within the process.
static BUILD_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// What the bridge reports about the on-device model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    /// Reason code, e.g. `deviceNotEligible`, `appleIntelligenceNotEnabled`,
    /// `modelNotReady`, `noBinary`, `error`. New codes pass through as-is.
    Unavailable(String),
}

impl Availability {
    /// Parse the bridge's `--check` output.
    pub fn parse(output: &str) -> Self {
        match output.trim() {
            "available" => Availability::Available,
            other => Availability::Unavailable(
                other
                    .strip_prefix("unavailable:")
                    .unwrap_or(other)
                    .to_string(),
            ),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    /// One-line explanation for the user.
    pub fn describe(&self) -> String {
        match self {
            Availability::Available => "Apple Intelligence is available.".into(),
            Availability::Unavailable(reason) => match reason.as_str() {
                "deviceNotEligible" => "This Mac does not support Apple Intelligence.".into(),
                "appleIntelligenceNotEnabled" => {
                    "Apple Intelligence is not enabled. Enable it in System Settings > Apple Intelligence & Siri.".into()
                }
                "modelNotReady" => "Model is still downloading. Try again shortly.".into(),
                "noBinary" => BUILD_FAILED.into(),
                other => format!("On-device model unavailable: {other}"),
            },
        }
    }
}

impl std::fmt::Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Available => f.write_str("available"),
            Availability::Unavailable(reason) => write!(f, "unavailable:{reason}"),
        }
    }
}

/// Apple on-device model, driven through a one-shot subprocess.
///
/// The bridge is compiled from Swift on first use. Builds go to a temporary
/// file that is renamed into place, so a binary that exists is always
/// complete.
pub struct OnDeviceProvider {
    source: PathBuf,
    binary: PathBuf,
}

impl OnDeviceProvider {
    pub fn new(paths: &Paths) -> Self {
        Self {
            source: paths.bridge_source(),
            binary: paths.bridge_binary(),
        }
    }

    /// Whether this platform can run the on-device model at all.
    pub fn is_supported() -> bool {
        cfg!(target_os = "macos")
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Build the bridge if it is not there yet.
    pub async fn ensure_binary(&self) -> Result<()> {
        if self.binary.exists() {
            return Ok(());
        }
        let _guard = BUILD_LOCK.lock().await;
        // Another caller may have finished the build while we waited.
        if self.binary.exists() {
            return Ok(());
        }
        self.build().await
    }

    async fn build(&self) -> Result<()> {
        if let Some(dir) = self.binary.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if !self.source.exists() {
            debug!(path = ?self.source, "writing bridge source");
            tokio::fs::write(&self.source, BRIDGE_SOURCE).await?;
        }

        let staging = self
            .binary
            .with_file_name(format!("afm-bridge.build-{}", std::process::id()));
        info!(source = ?self.source, "compiling on-device bridge");

        let mut cmd = Command::new("xcrun");
        cmd.arg("swiftc")
            .arg(&self.source)
            .arg("-o")
            .arg(&staging)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(BUILD_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(error = %e, "could not start swiftc");
                return Err(GregError::Bridge(BUILD_FAILED.into()));
            }
            Err(_) => {
                warn!("bridge build timed out");
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(GregError::Bridge(BUILD_FAILED.into()));
            }
        };

        if !output.status.success() {
            warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "bridge build failed"
            );
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(GregError::Bridge(BUILD_FAILED.into()));
        }

        tokio::fs::rename(&staging, &self.binary).await?;
        info!(binary = ?self.binary, "on-device bridge ready");
        Ok(())
    }

    /// Ask the bridge whether the model can be used right now.
    pub async fn check_availability(&self) -> Availability {
        if self.ensure_binary().await.is_err() {
            return Availability::Unavailable("noBinary".into());
        }

        let mut cmd = Command::new(&self.binary);
        cmd.arg("--check").stdin(Stdio::null()).kill_on_drop(true);

        match tokio::time::timeout(CHECK_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Availability::parse(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(_)) | Ok(Err(_)) | Err(_) => Availability::Unavailable("error".into()),
        }
    }

    async fn run(&self, request: &LlmRequest) -> Result<String> {
        self.ensure_binary().await?;

        let payload = serde_json::json!({
            "systemPrompt": request.system,
            "userPrompt": request.user,
        })
        .to_string();

        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GregError::Bridge(format!("could not start AFM bridge: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            // A bridge that exits early closes the pipe; its stderr says why.
            if let Err(e) = stdin.write_all(payload.as_bytes()).await {
                debug!(error = %e, "bridge stdin closed early");
            }
        }

        let output = tokio::time::timeout(RUN_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                GregError::Bridge(format!(
                    "AFM bridge timed out after {}s",
                    RUN_TIMEOUT.as_secs()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GregError::Bridge(if stderr.is_empty() {
                "AFM bridge exited with an error".into()
            } else {
                stderr
            }));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl LlmProvider for OnDeviceProvider {
    fn name(&self) -> &str {
        "On-device"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String> {
        self.run(request).await
    }

    /// The bridge answers in one piece: one content chunk, then done.
    async fn stream(
        &self,
        request: &LlmRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<StreamChunk>> {
        let (tx, rx) = tokio::sync::mpsc::channel(2);
        let chunks = match self.run(request).await {
            Ok(text) => vec![StreamChunk::Content(text), StreamChunk::Done],
            Err(e) => vec![StreamChunk::Error(e.to_string())],
        };
        for chunk in chunks {
            let _ = tx.send(chunk).await;
        }
        Ok(rx)
    }
}
