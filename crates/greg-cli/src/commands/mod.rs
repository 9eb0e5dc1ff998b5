use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use greg_config::{ConfigLoader, GregConfig, Paths};

pub mod chat;
pub mod editor;
mod run;
pub mod setup;
pub mod skills;

/// Natural language to shell commands, from the terminal.
#[derive(Parser, Debug)]
#[command(name = "greg", version, about, long_about = None)]
pub struct Cli {
    /// Choose a provider and store its credentials
    #[arg(long, conflicts_with_all = ["skills", "chat"])]
    setup: bool,

    /// Manage skills: list | add <name> | edit <name> | path
    #[arg(long, num_args = 0.., value_name = "ARGS", conflicts_with = "chat")]
    skills: Option<Vec<String>>,

    /// Interactive streaming session
    #[arg(long)]
    chat: bool,

    /// Configuration directory (default: ~/.config/greg)
    #[arg(long, env = "GREG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// What you want to do, in plain words
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "REQUEST")]
    prompt: Vec<String>,
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Setup,
    Skills(Vec<String>),
    Chat,
    Editor,
    Prompt(String),
}

impl Cli {
    pub fn route(&self) -> Route {
        if self.setup {
            Route::Setup
        } else if let Some(args) = &self.skills {
            Route::Skills(args.clone())
        } else if self.chat {
            Route::Chat
        } else if self.prompt.is_empty() {
            Route::Editor
        } else {
            Route::Prompt(self.prompt.join(" "))
        }
    }

    fn log_level(&self) -> &str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level.as_deref().unwrap_or("warn")
        }
    }

    /// Run the command line. Returns the process exit code.
    pub async fn run(self) -> greg_core::Result<i32> {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(self.log_level())),
            )
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();

        let paths = Paths::resolve(self.config_dir.as_deref());
        let route = self.route();
        debug!(?route, config_dir = ?paths.config_dir(), "starting");

        match route {
            Route::Setup => {
                setup::cmd_setup(&paths).await?;
                Ok(0)
            }
            Route::Skills(args) => skills::cmd_skills(&paths, &args).await,
            Route::Editor => editor::cmd_editor().await,
            Route::Chat => {
                let config = load_or_setup(&paths).await?;
                chat::cmd_chat(&paths, &config).await
            }
            Route::Prompt(prompt) => {
                let config = load_or_setup(&paths).await?;
                run::cmd_run(&paths, &config, &prompt).await
            }
        }
    }
}

/// Existing configuration, or the result of the setup wizard when none is
/// stored yet.
async fn load_or_setup(paths: &Paths) -> greg_core::Result<GregConfig> {
    match ConfigLoader::load(paths)? {
        Some(config) => Ok(config),
        None => setup::cmd_setup(paths).await,
    }
}
