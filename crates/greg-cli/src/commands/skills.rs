use console::style;
use std::path::{Path, PathBuf};

use greg_config::Paths;
use greg_skills::SkillStore;

use super::editor::editor_from_env;
use crate::ui;

/// `greg --skills …` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillsAction {
    List,
    Add(String),
    Edit(String),
    Path,
    Usage,
}

impl SkillsAction {
    pub fn parse(args: &[String]) -> Self {
        match args {
            [] => SkillsAction::List,
            [sub, ..] if sub == "list" => SkillsAction::List,
            [sub, ..] if sub == "path" => SkillsAction::Path,
            [sub, name, ..] if sub == "add" => SkillsAction::Add(name.clone()),
            [sub, name, ..] if sub == "edit" => SkillsAction::Edit(name.clone()),
            _ => SkillsAction::Usage,
        }
    }
}

/// One line per skill for `--skills list`.
pub fn listing_lines(store: &SkillStore) -> Vec<(String, String)> {
    store
        .load()
        .into_iter()
        .map(|s| {
            let about = if s.is_global() {
                "(always active)".to_string()
            } else {
                s.description
            };
            (s.name, about)
        })
        .collect()
}

/// File backing skill `name` (with or without `.md`), if it exists. A file
/// with no instructions yet is still editable.
pub fn editable_path(store: &SkillStore, name: &str) -> Option<PathBuf> {
    let name = name.strip_suffix(".md").unwrap_or(name);
    if name.is_empty() || name.contains(['/', '\\']) {
        return None;
    }
    let path = store.path_for(name);
    path.is_file().then_some(path)
}

async fn open_in_editor(path: &Path) -> greg_core::Result<()> {
    tokio::process::Command::new(editor_from_env())
        .arg(path)
        .status()
        .await?;
    Ok(())
}

pub(super) async fn cmd_skills(paths: &Paths, args: &[String]) -> greg_core::Result<i32> {
    let store = SkillStore::from_paths(paths);

    match SkillsAction::parse(args) {
        SkillsAction::List => {
            let skills = listing_lines(&store);
            if skills.is_empty() {
                ui::dim("No skills found.");
                ui::dim("Add one with: greg --skills add <name>");
                ui::dim(format!("Skills directory: {}", store.dir().display()));
            } else {
                eprintln!("{}\n", style("Skills:").bold());
                for (name, about) in skills {
                    eprintln!("  {}  {}", style(name).green(), style(about).dim());
                }
                eprintln!();
                ui::dim(format!("Directory: {}", store.dir().display()));
            }
        }
        SkillsAction::Add(name) => {
            let path = store.create(&name)?;
            open_in_editor(&path).await?;
            eprintln!("{}", style(format!("Skill saved: {}", path.display())).green());
        }
        SkillsAction::Edit(name) => {
            let Some(path) = editable_path(&store, &name) else {
                let names: Vec<String> = store.load().into_iter().map(|s| s.name).collect();
                let available = if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                };
                eprintln!("{}", style(format!("Skill \"{name}\" not found.")).red());
                ui::dim(format!("Available skills: {available}"));
                return Ok(1);
            };
            open_in_editor(&path).await?;
            eprintln!("{}", style(format!("Skill updated: {}", path.display())).green());
        }
        SkillsAction::Path => {
            println!("{}", store.dir().display());
        }
        SkillsAction::Usage => {
            eprintln!("{}", style("Usage:").bold());
            for (usage, about) in [
                ("greg --skills             ", "List all skills"),
                ("greg --skills list        ", "List all skills"),
                ("greg --skills add <name>  ", "Create and edit a new skill"),
                ("greg --skills edit <name> ", "Edit an existing skill"),
                ("greg --skills path        ", "Print skills directory path"),
            ] {
                eprintln!("  {usage} {}", style(about).dim());
            }
        }
    }
    Ok(0)
}
