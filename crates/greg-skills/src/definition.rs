use serde::Serialize;
use std::path::{Path, PathBuf};

/// A skill parsed from `<skills_dir>/<name>.md`.
///
/// ```text
/// ---
/// description: When this skill should activate
/// ---
///
/// Instructions for the model...
/// ```
///
/// The frontmatter block is optional. Without it, or with an empty
/// `description`, the skill is global and always active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    /// File name without the `.md` extension.
    pub name: String,
    pub description: String,
    /// Instructions, never empty.
    pub content: String,
    /// File the skill was read from.
    pub origin: PathBuf,
}

impl Skill {
    /// Parse a skill source. Returns `None` for an empty source or one whose
    /// instructions are empty once the frontmatter is removed.
    pub fn parse(name: impl Into<String>, source: &str, origin: impl Into<PathBuf>) -> Option<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return None;
        }

        let (description, content) = match split_frontmatter(trimmed) {
            Some((frontmatter, body)) => (parse_description(frontmatter), body.trim()),
            None => (String::new(), trimmed),
        };

        if content.is_empty() {
            return None;
        }

        Some(Self {
            name: name.into(),
            description,
            content: content.to_string(),
            origin: origin.into(),
        })
    }

    /// Read and parse a skill file. `Ok(None)` means the file holds no skill.
    pub fn from_file(path: &Path) -> greg_core::Result<Option<Self>> {
        let source = std::fs::read_to_string(path)?;
        Ok(Self::parse(skill_name(path), &source, path))
    }

    /// Skills without a description are always active.
    pub fn is_global(&self) -> bool {
        self.description.is_empty()
    }

    /// Render back to the on-disk format.
    pub fn to_source(&self) -> String {
        if self.is_global() {
            format!("{}\n", self.content)
        } else {
            format!("---\ndescription: {}\n---\n\n{}\n", self.description, self.content)
        }
    }
}

/// Skill name for a path: the file name minus a trailing `.md`.
pub fn skill_name(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file.strip_suffix(".md") {
        Some(stem) => stem.to_string(),
        None => file,
    }
}

/// Split `---` delimited frontmatter from the body.
///
/// The opening marker must be the first line. The closing marker is the
/// first later line that starts with `---` followed only by whitespace.
fn split_frontmatter(source: &str) -> Option<(&str, &str)> {
    let rest = source.strip_prefix("---")?;
    let rest = rest.trim_start_matches([' ', '\t', '\r']);
    let rest = rest.strip_prefix('\n')?;

    let mut from = 0;
    while let Some(offset) = rest[from..].find("\n---") {
        let end = from + offset;
        let after = rest[end + 4..].trim_start_matches([' ', '\t', '\r']);
        if after.is_empty() {
            return Some((&rest[..end], ""));
        }
        if let Some(body) = after.strip_prefix('\n') {
            return Some((&rest[..end], body));
        }
        from = end + 1;
    }
    None
}

/// Value of the first `description:` line of a frontmatter block.
fn parse_description(frontmatter: &str) -> String {
    frontmatter
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| *key == "description")
        .map(|(_, value)| unquote(value))
        .unwrap_or_default()
}

/// Remove surrounding quotes from a YAML value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
