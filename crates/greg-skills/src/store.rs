use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use greg_config::Paths;

use crate::definition::Skill;

/// Written by [`SkillStore::create`] for a new skill.
pub const SKILL_TEMPLATE: &str = "---
description: Describe when this skill should activate
---

Your skill instructions here.
";

/// The skills directory: `<config_dir>/skills/*.md`.
///
/// Nothing is cached. Every [`SkillStore::load`] reads the directory again,
/// so edits take effect on the next request.
#[derive(Debug, Clone)]
pub struct SkillStore {
    dir: PathBuf,
}

impl SkillStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_paths(paths: &Paths) -> Self {
        Self::new(paths.skills_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load every skill in the directory, sorted by name.
    ///
    /// A missing or unreadable directory yields no skills. Unreadable files,
    /// non-`.md` files and files without instructions are skipped.
    pub fn load(&self) -> Vec<Skill> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(dir = ?self.dir, "skills directory does not exist, skipping");
                return Vec::new();
            }
            Err(e) => {
                warn!(dir = ?self.dir, error = %e, "failed to read skills directory");
                return Vec::new();
            }
        };

        let mut skills = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_markdown = path
                .file_name()
                .is_some_and(|f| f.to_string_lossy().ends_with(".md"));
            if !is_markdown || !path.is_file() {
                continue;
            }
            match Skill::from_file(&path) {
                Ok(Some(skill)) => {
                    debug!(skill = %skill.name, path = ?path, "loaded skill");
                    skills.push(skill);
                }
                Ok(None) => debug!(path = ?path, "skill file has no instructions, skipping"),
                Err(e) => warn!(path = ?path, error = %e, "failed to load skill"),
            }
        }

        skills.sort_by(|a, b| a.name.cmp(&b.name));
        skills
    }

    /// Find a loaded skill by name.
    pub fn get(&self, name: &str) -> Option<Skill> {
        self.load().into_iter().find(|s| s.name == name)
    }

    /// File that holds (or would hold) the skill `name`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        if name.ends_with(".md") {
            self.dir.join(name)
        } else {
            self.dir.join(format!("{name}.md"))
        }
    }

    /// Create the skills directory if needed.
    pub fn ensure_dir(&self) -> greg_core::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    /// Create `name.md` from the template unless it already exists.
    /// Returns the file path either way.
    pub fn create(&self, name: &str) -> greg_core::Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(greg_core::GregError::Config(format!(
                "invalid skill name: {name:?}"
            )));
        }

        self.ensure_dir()?;
        let path = self.path_for(name);
        if !path.exists() {
            std::fs::write(&path, SKILL_TEMPLATE)?;
            info!(path = ?path, "created skill");
        }
        Ok(path)
    }
}
