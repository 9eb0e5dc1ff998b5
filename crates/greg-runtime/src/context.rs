use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use greg_config::Paths;
use greg_core::{Arch, GregError, Os, Profile, Result, TerminalContext};

/// Upper bound on the `ls -la` call.
const LISTING_TIMEOUT: Duration = Duration::from_secs(3);

/// Builds a [`TerminalContext`] for one request.
///
/// Never fails. Each field that cannot be read is left empty.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    history_file: PathBuf,
    cwd: Option<PathBuf>,
    profile: Profile,
}

impl ContextAssembler {
    pub fn new(paths: &Paths, profile: Profile) -> Self {
        Self {
            history_file: paths.history_file().to_path_buf(),
            cwd: None,
            profile,
        }
    }

    /// Use `cwd` instead of the process working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub async fn assemble(&self) -> TerminalContext {
        let cwd = match &self.cwd {
            Some(dir) => Some(dir.clone()),
            None => std::env::current_dir().ok(),
        };

        let history = read_history(&self.history_file, self.profile.history_lines())
            .await
            .unwrap_or_else(|e| {
                debug!(path = ?self.history_file, error = %e, "shell history unavailable");
                String::new()
            });

        let dir_listing = match &cwd {
            Some(dir) => list_directory(dir, self.profile.listing_lines())
                .await
                .unwrap_or_else(|e| {
                    debug!(dir = ?dir, error = %e, "directory listing unavailable");
                    String::new()
                }),
            None => String::new(),
        };

        TerminalContext {
            cwd: cwd
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            os_name: Os::current().display_name().to_string(),
            arch_name: Arch::current().display_name().to_string(),
            history,
            dir_listing,
        }
    }
}

async fn read_history(path: &Path, max_lines: usize) -> Result<String> {
    let raw = tokio::fs::read(path).await?;
    Ok(parse_history(&String::from_utf8_lossy(&raw), max_lines))
}

/// Last `max_lines` non-blank commands of a zsh history file, with extended
/// history timestamps (`: 1700000000:0;`) removed.
pub fn parse_history(raw: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = raw
        .lines()
        .map(|l| strip_timestamp(l).trim())
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

fn strip_timestamp(line: &str) -> &str {
    fn digits(s: &str) -> Option<&str> {
        let rest = s.trim_start_matches(|c: char| c.is_ascii_digit());
        (rest.len() < s.len()).then_some(rest)
    }

    let stripped = line
        .strip_prefix(": ")
        .and_then(digits)
        .and_then(|s| s.strip_prefix(':'))
        .and_then(digits)
        .and_then(|s| s.strip_prefix(';'));
    stripped.unwrap_or(line)
}

async fn list_directory(dir: &Path, max_lines: usize) -> Result<String> {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c")
        .arg("ls -la")
        .current_dir(dir)
        .stdin(std::process::Stdio::null())
        .kill_on_drop(true);

    let output = tokio::time::timeout(LISTING_TIMEOUT, cmd.output())
        .await
        .map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("ls timed out after {}s", LISTING_TIMEOUT.as_secs()),
            )
        })??;
    if !output.status.success() {
        return Err(GregError::Io(std::io::Error::other(format!(
            "ls exited with {}",
            output.status
        ))));
    }
    Ok(truncate_listing(
        String::from_utf8_lossy(&output.stdout).trim(),
        max_lines,
    ))
}

/// Keep the first `max_lines` lines and summarize the rest.
pub fn truncate_listing(full: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = full.split('\n').collect();
    if lines.len() <= max_lines {
        return full.to_string();
    }
    format!(
        "{}\n... ({} more)",
        lines[..max_lines].join("\n"),
        lines.len() - max_lines
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_timestamp() {
        assert_eq!(strip_timestamp(": 1700000000:0;git status"), "git status");
        assert_eq!(strip_timestamp("plain command"), "plain command");
        assert_eq!(strip_timestamp(": not:a;stamp"), ": not:a;stamp");
        assert_eq!(strip_timestamp(": 12:;x"), ": 12:;x");
    }

    #[test]
    fn test_parse_history_keeps_tail() {
        let raw = ": 1:0;ls\n\n: 2:0;cd src\n   \npwd\n: 3:0;git log\n";
        assert_eq!(parse_history(raw, 2), "pwd\ngit log");
        assert_eq!(parse_history(raw, 10), "ls\ncd src\npwd\ngit log");
        assert_eq!(parse_history("", 5), "");
    }

    #[test]
    fn test_truncate_listing() {
        let full = (1..=8).map(|i| format!("line{i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(truncate_listing(&full, 8), full);
        assert_eq!(truncate_listing(&full, 3), "line1\nline2\nline3\n... (5 more)");
    }
}
