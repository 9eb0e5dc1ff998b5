use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Broad family a rule belongs to. Used for logging only; every match
/// requires the same single confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DangerCategory {
    FileDeletion,
    FileModification,
    WriteRedirection,
    InPlaceEdit,
    PackageManager,
    VersionControl,
    ProcessControl,
    Container,
    Disk,
    Network,
}

impl std::fmt::Display for DangerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DangerCategory::FileDeletion => "file deletion",
            DangerCategory::FileModification => "file modification",
            DangerCategory::WriteRedirection => "write redirection",
            DangerCategory::InPlaceEdit => "in-place edit",
            DangerCategory::PackageManager => "package manager",
            DangerCategory::VersionControl => "version control",
            DangerCategory::ProcessControl => "process control",
            DangerCategory::Container => "container",
            DangerCategory::Disk => "disk",
            DangerCategory::Network => "network",
        };
        f.write_str(s)
    }
}

/// One pattern that marks a command as side-effecting.
#[derive(Debug)]
pub struct DangerRule {
    pub name: &'static str,
    pub category: DangerCategory,
    pattern: Regex,
}

impl DangerRule {
    fn new(name: &'static str, category: DangerCategory, pattern: &str) -> Option<Self> {
        match Regex::new(pattern) {
            Ok(pattern) => Some(Self {
                name,
                category,
                pattern,
            }),
            Err(e) => {
                debug!(rule = name, error = %e, "skipping invalid danger pattern");
                None
            }
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        self.pattern.is_match(command)
    }
}

static RULES: LazyLock<Vec<DangerRule>> = LazyLock::new(|| {
    use DangerCategory::*;

    [
        ("rm", FileDeletion, r"\brm\b"),
        ("rmdir", FileDeletion, r"\brmdir\b"),
        ("unlink", FileDeletion, r"\bunlink\b"),
        ("trash", FileDeletion, r"\btrash\b"),
        ("mv", FileModification, r"\bmv\b"),
        ("cp", FileModification, r"\bcp\b"),
        ("chmod", FileModification, r"\bchmod\b"),
        ("chown", FileModification, r"\bchown\b"),
        ("chgrp", FileModification, r"\bchgrp\b"),
        ("truncate", FileModification, r"\btruncate\b"),
        ("mkdir", FileModification, r"\bmkdir\b"),
        ("touch", FileModification, r"\btouch\b"),
        ("ln", FileModification, r"\bln\b"),
        // `>` and `>>`, but not the `|>` of some shells' pipelines.
        ("redirect", WriteRedirection, r"[^|]>"),
        ("tee", WriteRedirection, r"\btee\b"),
        ("dd", WriteRedirection, r"\bdd\b"),
        ("sed -i", InPlaceEdit, r"\bsed\s.*-i\b"),
        ("perl -i", InPlaceEdit, r"\bperl\s.*-[ip]"),
        ("patch", InPlaceEdit, r"\bpatch\b"),
        ("brew", PackageManager, r"\bbrew\s+(install|uninstall|remove|cleanup|autoremove)\b"),
        ("npm", PackageManager, r"\bnpm\s+(install|uninstall|remove|ci|link|prune)\b"),
        ("bun", PackageManager, r"\bbun\s+(install|remove|link|add)\b"),
        ("pip", PackageManager, r"\bpip\s+(install|uninstall)\b"),
        ("apt", PackageManager, r"\bapt(-get)?\s+(install|remove|purge|autoremove)\b"),
        (
            "git",
            VersionControl,
            r"\bgit\s+(push|reset|clean|checkout\s+--?\s|stash\s+drop|branch\s+-[dD]|rebase|merge|commit|add|tag\s+-d)\b",
        ),
        ("sudo", ProcessControl, r"\bsudo\b"),
        ("kill", ProcessControl, r"\bkill\b"),
        ("killall", ProcessControl, r"\bkillall\b"),
        ("pkill", ProcessControl, r"\bpkill\b"),
        ("shutdown", ProcessControl, r"\bshutdown\b"),
        ("reboot", ProcessControl, r"\breboot\b"),
        ("launchctl", ProcessControl, r"\blaunchctl\b"),
        ("systemctl", ProcessControl, r"\bsystemctl\b"),
        ("docker", Container, r"\bdocker\s+(rm|rmi|prune|stop|kill|system\s+prune)\b"),
        ("mkfs", Disk, r"\bmkfs\b"),
        ("fdisk", Disk, r"\bfdisk\b"),
        ("diskutil", Disk, r"\bdiskutil\b"),
        ("curl verb", Network, r"\bcurl\b.*-[Xx]\s*(POST|PUT|DELETE|PATCH)"),
        ("curl -o", Network, r"\bcurl\b.*-o\b"),
        ("wget", Network, r"\bwget\b"),
    ]
    .into_iter()
    .filter_map(|(name, category, pattern)| DangerRule::new(name, category, pattern))
    .collect()
});

/// Applies the built-in rule set, in order, to a command string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DangerClassifier;

impl DangerClassifier {
    pub fn new() -> Self {
        Self
    }

    /// First rule that matches anywhere in `command`, if any.
    pub fn classify(&self, command: &str) -> Option<&'static DangerRule> {
        let rule = RULES.iter().find(|rule| rule.matches(command));
        if let Some(rule) = rule {
            debug!(rule = rule.name, category = %rule.category, "command flagged");
        }
        rule
    }

    pub fn is_dangerous(&self, command: &str) -> bool {
        self.classify(command).is_some()
    }

    pub fn rules(&self) -> &'static [DangerRule] {
        &RULES
    }
}

/// Whether `command` should be confirmed before running.
pub fn is_dangerous(command: &str) -> bool {
    DangerClassifier.is_dangerous(command)
}
