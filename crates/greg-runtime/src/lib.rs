//! # greg-runtime
//!
//! Everything between a natural-language request and a shell command:
//!
//! - [`context`] snapshots the terminal (cwd, history, directory listing)
//! - [`prompt`] renders the system prompt
//! - [`pipeline`] generates a command, asks before risky ones and runs it
//! - [`commands`] and [`history`] hold the slash-command and recall logic
//! - [`session`] is the interactive, streaming state machine

pub mod commands;
pub mod context;
pub mod history;
pub mod pipeline;
pub mod prompt;
pub mod session;

pub use context::ContextAssembler;
pub use history::PromptHistory;
pub use pipeline::{CommandPipeline, CommandRunner, Confirm, Generation, Outcome, ShellRunner};
pub use session::{ClipboardSource, Phase, PendingRequest, Session, SessionState};
