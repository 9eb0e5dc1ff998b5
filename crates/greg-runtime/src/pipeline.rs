use async_trait::async_trait;
use std::process::Stdio;
use tracing::{debug, info};

use greg_config::Paths;
use greg_core::{GregError, Result};
use greg_llm::dispatcher::COMMAND_MAX_TOKENS;
use greg_llm::{strip_code_fences, Dispatcher};
use greg_safety::{DangerClassifier, DangerRule};
use greg_skills::{select_skills, SkillStore};

use crate::context::ContextAssembler;
use crate::prompt::build_command_prompt;

/// Asks the user whether a flagged command may run.
pub trait Confirm: Send + Sync {
    /// `true` to run `command`. `rule` is the first danger rule it matched.
    fn confirm(&self, command: &str, rule: &DangerRule) -> Result<bool>;
}

/// Only an explicit `n` declines; anything else, including an empty
/// answer, runs the command.
pub fn is_decline(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("n")
}

/// A generated command and the names of the conditional skills used for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub command: String,
    pub skills: Vec<String>,
}

/// Executes a command and reports its exit status.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<i32>;
}

/// Runs commands through the user's shell with inherited stdio.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// `$SHELL`, falling back to the platform default.
    pub fn from_env() -> Self {
        Self::new(resolve_shell(std::env::var("SHELL").ok()))
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }
}

/// `/bin/zsh` on macOS, `/bin/sh` elsewhere.
pub fn default_shell() -> &'static str {
    if cfg!(target_os = "macos") {
        "/bin/zsh"
    } else {
        "/bin/sh"
    }
}

fn resolve_shell(env: Option<String>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_shell().to_string())
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<i32> {
        info!(shell = %self.shell, "executing command");
        let status = tokio::process::Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await?;
        Ok(status.code().unwrap_or(1))
    }
}

/// What happened to a generated command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and exited with this code.
    Executed(i32),
    /// The user declined the confirmation.
    Declined,
}

impl Outcome {
    /// Process exit code for greg itself.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Executed(code) => code,
            Outcome::Declined => 0,
        }
    }
}

/// One-shot request: context, skills, prompt, generation, confirmation and
/// execution.
pub struct CommandPipeline {
    dispatcher: Dispatcher,
    store: SkillStore,
    context: ContextAssembler,
    classifier: DangerClassifier,
}

impl CommandPipeline {
    pub fn new(dispatcher: Dispatcher, paths: &Paths) -> Self {
        let context = ContextAssembler::new(paths, dispatcher.profile());
        Self {
            dispatcher,
            store: SkillStore::from_paths(paths),
            context,
            classifier: DangerClassifier::new(),
        }
    }

    /// Replace the context assembler, e.g. to pin the working directory.
    pub fn with_context(mut self, context: ContextAssembler) -> Self {
        self.context = context;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// System prompt for `prompt`: fresh context plus the skills that apply.
    pub async fn system_prompt(&self, prompt: &str) -> String {
        self.prepare(prompt).await.0
    }

    async fn prepare(&self, prompt: &str) -> (String, Vec<String>) {
        let ctx = self.context.assemble().await;
        let skills = self.store.load();
        let selected = select_skills(&self.dispatcher, &skills, prompt).await;
        let applied = selected
            .iter()
            .filter(|s| !s.is_global())
            .map(|s| s.name.clone())
            .collect();
        (build_command_prompt(&ctx, &selected), applied)
    }

    /// Generate a shell command for `prompt`, reporting the conditional
    /// skills that were applied.
    pub async fn generate(&self, prompt: &str) -> Result<Generation> {
        let (system, skills) = self.prepare(prompt).await;
        debug!(prompt_len = prompt.len(), system_len = system.len(), "generating command");

        let raw = self
            .dispatcher
            .complete(&system, prompt, COMMAND_MAX_TOKENS)
            .await?;
        let command = strip_code_fences(&raw);
        if command.is_empty() {
            return Err(GregError::EmptyGeneration);
        }
        Ok(Generation { command, skills })
    }

    /// Generate a shell command for `prompt`.
    pub async fn generate_command(&self, prompt: &str) -> Result<String> {
        Ok(self.generate(prompt).await?.command)
    }

    /// Confirm `command` if it looks risky, then run it.
    pub async fn execute(
        &self,
        command: &str,
        confirm: &dyn Confirm,
        runner: &dyn CommandRunner,
    ) -> Result<Outcome> {
        if let Some(rule) = self.classifier.classify(command)
            && !confirm.confirm(command, rule)?
        {
            info!(rule = rule.name, "command declined");
            return Ok(Outcome::Declined);
        }
        Ok(Outcome::Executed(runner.run(command).await?))
    }
}
