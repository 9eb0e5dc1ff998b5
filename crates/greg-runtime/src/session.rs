//! Interactive session state machine.
//!
//! ```text
//! Idle ──submit──▶ Sending ──chunk──▶ Streaming ──Done──▶ Done
//!                     │                   │
//!                     └──────Error────────┴────────────▶ Error
//! ```
//!
//! [`Session::show`] resets everything except the prompt history and starts
//! a new generation. Chunks and failures carry the generation they belong
//! to; stale ones are dropped, so a dismissed request cannot write into a
//! fresh session.

use tracing::{debug, warn};

use greg_llm::dispatcher::SESSION_MAX_TOKENS;
use greg_llm::{Dispatcher, StreamChunk};

use crate::commands::{
    append_reasoning, build_history_entry, filter_commands, process_input, CLIPBOARD_COMMAND,
    KNOWN_COMMANDS,
};
use crate::history::PromptHistory;
use crate::prompt::CHAT_SYSTEM_PROMPT;

/// Lines of reasoning kept visible while the model thinks.
pub const REASONING_MAX_LINES: usize = 4;

/// Source of clipboard text for `/c` and the clipboard offer.
pub trait ClipboardSource: Send + Sync {
    fn read_text(&self) -> Option<String>;
}

/// Clipboard that is always empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClipboard;

impl ClipboardSource for NoClipboard {
    fn read_text(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Sending,
    Streaming,
    Done,
    Error,
}

impl Phase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Sending | Phase::Streaming)
    }
}

/// Request produced by [`Session::submit`], to be streamed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub generation: u64,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Everything the UI renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub input: String,
    pub response: String,
    /// Rolling window of the last [`REASONING_MAX_LINES`] reasoning lines.
    pub reasoning: String,
    pub is_loading: bool,
    pub is_reasoning: bool,
    pub error_message: Option<String>,
    /// Text attached to every prompt, usually from the clipboard.
    pub context: Option<String>,
    /// Clipboard text captured on show, waiting to be accepted.
    pub clipboard_offer: Option<String>,
    pub active_commands: Vec<String>,
    pub history: PromptHistory,
}

impl SessionState {
    pub fn history_cursor(&self) -> Option<usize> {
        self.history.cursor()
    }
}

pub struct Session {
    state: SessionState,
    phase: Phase,
    generation: u64,
    system_prompt: String,
    clipboard: Box<dyn ClipboardSource>,
}

impl Session {
    pub fn new(clipboard: Box<dyn ClipboardSource>) -> Self {
        Self {
            state: SessionState::default(),
            phase: Phase::Idle,
            generation: 0,
            system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
            clipboard,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset for a fresh interaction. History survives; any in-flight
    /// request becomes stale.
    pub fn show(&mut self) {
        let history = std::mem::take(&mut self.state.history);
        self.state = SessionState {
            history,
            clipboard_offer: self.read_clipboard(),
            ..SessionState::default()
        };
        self.phase = Phase::Idle;
        self.generation += 1;
        debug!(generation = self.generation, "session reset");
    }

    /// Replace the input text, activating any completed slash command.
    pub fn edit_input(&mut self, text: &str) {
        let (input, active) = process_input(text, KNOWN_COMMANDS, &self.state.active_commands);
        self.state.input = input;
        self.state.active_commands = active;
    }

    /// Commands that complete the partial `/word` in the input.
    pub fn command_suggestions(&self) -> Vec<&'static str> {
        filter_commands(&self.state.input, KNOWN_COMMANDS, &self.state.active_commands)
    }

    /// Start a request from the current input.
    ///
    /// Returns `None` when the input is blank or a request is in flight.
    pub fn submit(&mut self) -> Option<PendingRequest> {
        let raw = self.state.input.trim().to_string();
        if raw.is_empty() || self.state.is_loading {
            return None;
        }

        if self.command_active(CLIPBOARD_COMMAND) && self.state.context.is_none() {
            self.state.context = self.read_clipboard();
        }

        let user_prompt = match self.state.context.as_deref() {
            Some(context) if !context.is_empty() => format!("Context:\n{context}\n\n{raw}"),
            _ => raw.clone(),
        };

        self.state
            .history
            .push(build_history_entry(&raw, &self.state.active_commands));
        self.state.input.clear();
        self.state.response.clear();
        self.state.reasoning.clear();
        self.state.error_message = None;
        self.state.is_loading = true;
        self.state.is_reasoning = false;
        self.phase = Phase::Sending;

        Some(PendingRequest {
            generation: self.generation,
            system_prompt: self.system_prompt.clone(),
            user_prompt,
        })
    }

    /// Fold one streamed chunk into the state. Returns `false` when the
    /// chunk was dropped as stale or late.
    pub fn apply_chunk(&mut self, generation: u64, chunk: StreamChunk) -> bool {
        if generation != self.generation || !self.phase.is_in_flight() {
            debug!(generation, current = self.generation, "dropping chunk");
            return false;
        }

        match chunk {
            StreamChunk::Reasoning(text) => {
                self.state.is_reasoning = true;
                self.state.reasoning =
                    append_reasoning(&self.state.reasoning, &text, REASONING_MAX_LINES);
                self.phase = Phase::Streaming;
            }
            StreamChunk::Content(text) => {
                self.state.is_reasoning = false;
                self.state.response.push_str(&text);
                self.phase = Phase::Streaming;
            }
            StreamChunk::Done => {
                self.state.is_loading = false;
                self.state.is_reasoning = false;
                self.phase = Phase::Done;
            }
            StreamChunk::Error(message) => {
                self.enter_error(message);
            }
        }
        true
    }

    /// The request failed before streaming started.
    pub fn fail(&mut self, generation: u64, message: impl Into<String>) -> bool {
        if generation != self.generation || !self.phase.is_in_flight() {
            return false;
        }
        self.enter_error(message.into());
        true
    }

    /// Attach the clipboard text offered on show.
    pub fn accept_clipboard_offer(&mut self) {
        if let Some(offer) = self.state.clipboard_offer.take() {
            self.state.context = Some(offer);
        }
    }

    /// Drop the attached context and the `/c` command that produced it.
    pub fn clear_context(&mut self) {
        self.state.context = None;
        self.state
            .active_commands
            .retain(|c| c != CLIPBOARD_COMMAND);
    }

    /// Recall an older prompt into the input.
    pub fn history_back(&mut self) {
        if let Some(entry) = self.state.history.back().map(str::to_string) {
            self.load_entry(&entry);
        }
    }

    /// Recall a newer prompt, or clear the input past the newest.
    pub fn history_forward(&mut self) {
        if let Some(entry) = self.state.history.forward().map(str::to_string) {
            self.load_entry(&entry);
        }
    }

    /// Put a history entry back into the input, re-activating the commands
    /// it was sent with.
    pub fn load_entry(&mut self, entry: &str) {
        let (input, commands) = process_input(&format!("{entry} "), KNOWN_COMMANDS, &[]);
        for cmd in commands {
            if !self.command_active(&cmd) {
                self.state.active_commands.push(cmd);
            }
        }
        self.state.input = input;
    }

    fn command_active(&self, cmd: &str) -> bool {
        self.state.active_commands.iter().any(|c| c == cmd)
    }

    fn read_clipboard(&self) -> Option<String> {
        self.clipboard
            .read_text()
            .filter(|text| !text.trim().is_empty())
    }

    fn enter_error(&mut self, message: String) {
        warn!(error = %message, "session request failed");
        self.state.error_message = Some(message);
        self.state.is_loading = false;
        self.state.is_reasoning = false;
        self.phase = Phase::Error;
    }
}

/// Stream `pending` through `dispatcher` into `session`, calling `on_chunk`
/// after each applied chunk.
///
/// A channel that closes without a terminal chunk counts as `Done`.
pub async fn drive<F>(
    dispatcher: &Dispatcher,
    session: &mut Session,
    pending: &PendingRequest,
    mut on_chunk: F,
) where
    F: FnMut(&StreamChunk, &SessionState),
{
    let mut rx = match dispatcher
        .stream(&pending.system_prompt, &pending.user_prompt, SESSION_MAX_TOKENS)
        .await
    {
        Ok(rx) => rx,
        Err(e) => {
            session.fail(pending.generation, e.to_string());
            return;
        }
    };

    while let Some(chunk) = rx.recv().await {
        let terminal = chunk.is_terminal();
        if session.apply_chunk(pending.generation, chunk.clone()) {
            on_chunk(&chunk, session.state());
        }
        if terminal {
            return;
        }
    }

    if session.apply_chunk(pending.generation, StreamChunk::Done) {
        on_chunk(&StreamChunk::Done, session.state());
    }
}
