use console::style;
use std::path::{Path, PathBuf};
use tracing::debug;

use greg_runtime::{CommandRunner, ShellRunner};

use crate::ui;

/// Result of one editor round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Composed {
    Script(String),
    Empty,
    EditorFailed,
}

/// `$EDITOR`, or `vim`.
pub fn editor_from_env() -> String {
    std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| "vim".to_string())
}

fn temp_script(dir: &Path) -> PathBuf {
    dir.join(format!("greg-{}.sh", chrono::Utc::now().timestamp_millis()))
}

fn create_script_file(path: &Path) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o700);
    }
    options.open(path)?;
    Ok(())
}

/// Open `editor` on an empty script in `dir` and return what was written.
/// The file is removed afterwards.
pub async fn compose_script(editor: &str, dir: &Path) -> greg_core::Result<Composed> {
    let path = temp_script(dir);
    create_script_file(&path)?;
    debug!(editor, path = ?path, "opening editor");

    let composed = read_back(editor, &path).await;
    let _ = tokio::fs::remove_file(&path).await;
    composed
}

async fn read_back(editor: &str, path: &Path) -> greg_core::Result<Composed> {
    match tokio::process::Command::new(editor).arg(path).status().await {
        Ok(status) if status.success() => {
            let script = tokio::fs::read_to_string(path).await?;
            let script = script.trim();
            if script.is_empty() {
                Ok(Composed::Empty)
            } else {
                Ok(Composed::Script(script.to_string()))
            }
        }
        Ok(_) => Ok(Composed::EditorFailed),
        Err(e) => {
            debug!(editor, error = %e, "editor did not start");
            Ok(Composed::EditorFailed)
        }
    }
}

pub(super) async fn cmd_editor() -> greg_core::Result<i32> {
    match compose_script(&editor_from_env(), &std::env::temp_dir()).await? {
        Composed::EditorFailed => {
            eprintln!("{}", style("Editor exited with an error.").red());
            Ok(1)
        }
        Composed::Empty => {
            ui::dim("Empty file, nothing to run.");
            Ok(0)
        }
        Composed::Script(script) => {
            ui::print_command(&script);
            ShellRunner::from_env().run(&script).await
        }
    }
}
