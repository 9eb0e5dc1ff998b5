use std::path::{Path, PathBuf};

/// Where greg keeps its files.
///
/// Constructed once at startup and handed to every component that touches
/// the filesystem, so tests can point the whole tool at a temp directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    config_dir: PathBuf,
    history_file: PathBuf,
}

impl Paths {
    pub fn new(config_dir: impl Into<PathBuf>, history_file: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            history_file: history_file.into(),
        }
    }

    /// Resolve the config dir: explicit path > GREG_CONFIG_DIR env > ~/.config/greg
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        let config_dir = match explicit {
            Some(p) => p.to_path_buf(),
            None => match std::env::var("GREG_CONFIG_DIR") {
                Ok(p) if !p.is_empty() => PathBuf::from(p),
                _ => home.join(".config").join("greg"),
            },
        };
        Self::new(config_dir, home.join(".zsh_history"))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    pub fn skills_dir(&self) -> PathBuf {
        self.config_dir.join("skills")
    }

    /// Swift source of the on-device bridge.
    pub fn bridge_source(&self) -> PathBuf {
        self.config_dir.join("afm-bridge.swift")
    }

    /// Compiled on-device bridge binary.
    pub fn bridge_binary(&self) -> PathBuf {
        self.config_dir.join("afm-bridge")
    }

    /// Shell history read into the terminal context.
    pub fn history_file(&self) -> &Path {
        &self.history_file
    }
}
