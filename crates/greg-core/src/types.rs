use serde::{Deserialize, Serialize};

/// Host operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Linux,
    MacOS,
    Windows,
    Other,
}

impl Os {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "linux" => Os::Linux,
            "macos" => Os::MacOS,
            "windows" => Os::Windows,
            _ => Os::Other,
        }
    }

    /// Name shown to the model in the terminal context block.
    pub fn display_name(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOS => "macOS",
            Os::Windows => "windows",
            Os::Other => std::env::consts::OS,
        }
    }
}

/// Host CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arch {
    X86_64,
    Aarch64,
    Other,
}

impl Arch {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86_64" => Arch::X86_64,
            "aarch64" => Arch::Aarch64,
            _ => Arch::Other,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Arch::X86_64 => "x64",
            Arch::Aarch64 => "arm64",
            Arch::Other => std::env::consts::ARCH,
        }
    }
}

/// Truncation limits for the terminal context, chosen by provider.
///
/// On-device models have a much smaller context window, so they get a
/// shorter history and directory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Profile {
    Cloud,
    OnDevice,
}

impl Profile {
    /// Maximum number of shell-history lines kept.
    pub fn history_lines(self) -> usize {
        match self {
            Profile::Cloud => 30,
            Profile::OnDevice => 5,
        }
    }

    /// Maximum number of directory-listing lines kept before the summary line.
    pub fn listing_lines(self) -> usize {
        match self {
            Profile::Cloud => 50,
            Profile::OnDevice => 15,
        }
    }
}

/// Snapshot of the user's terminal, captured fresh for every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalContext {
    pub cwd: String,
    pub os_name: String,
    pub arch_name: String,
    /// Most recent commands, oldest first, newline separated.
    pub history: String,
    pub dir_listing: String,
}
