use console::style;
use std::io::Write;
use tokio::io::AsyncBufReadExt;
use tracing::debug;

use greg_config::{GregConfig, Paths};
use greg_core::error::message_suggests_setup;
use greg_llm::{Dispatcher, StreamChunk};
use greg_runtime::session::drive;
use greg_runtime::{ClipboardSource, Session};

use crate::ui;

/// Reads the system clipboard through the platform's paste tool.
pub struct SystemClipboard;

impl SystemClipboard {
    fn candidates() -> &'static [&'static [&'static str]] {
        if cfg!(target_os = "macos") {
            &[&["pbpaste"]]
        } else {
            &[
                &["wl-paste", "--no-newline"],
                &["xclip", "-selection", "clipboard", "-o"],
                &["xsel", "--clipboard", "--output"],
            ]
        }
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Option<String> {
        Self::candidates().iter().find_map(|argv| {
            let (program, args) = argv.split_first()?;
            let output = std::process::Command::new(program)
                .args(args)
                .stderr(std::process::Stdio::null())
                .output()
                .ok()?;
            output
                .status
                .success()
                .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}

/// A line typed at the chat prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    /// Start over; history is kept.
    Reset,
    AcceptClipboard,
    ClearContext,
    Previous,
    Next,
    /// Re-send the most recent prompt.
    Repeat,
    /// Submit the recalled prompt.
    SubmitRecalled,
    Text(String),
}

impl ChatInput {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "exit" | "quit" | "/exit" => ChatInput::Quit,
            ":new" => ChatInput::Reset,
            ":clip" => ChatInput::AcceptClipboard,
            ":clear" => ChatInput::ClearContext,
            ":prev" => ChatInput::Previous,
            ":next" => ChatInput::Next,
            "!!" => ChatInput::Repeat,
            "" => ChatInput::SubmitRecalled,
            _ => ChatInput::Text(line.trim_end().to_string()),
        }
    }
}

fn print_banner() {
    eprintln!("{}", style("Greg interactive session").bold());
    ui::dim("  /c <question>   attach the clipboard as context");
    ui::dim("  :clip / :clear  attach offered clipboard / drop context");
    ui::dim("  :prev / :next   recall earlier prompts, Enter to send");
    ui::dim("  !!              send the last prompt again");
    ui::dim("  :new            start over, exit to quit");
    eprintln!();
}

fn print_offer(session: &Session) {
    if let Some(offer) = &session.state().clipboard_offer {
        ui::dim(format!(
            "Clipboard has {} characters. Type :clip to attach it.",
            offer.chars().count()
        ));
    }
}

fn render(chunk: &StreamChunk) {
    match chunk {
        StreamChunk::Reasoning(text) => {
            eprint!("{}", style(text).dim().italic());
            std::io::stderr().flush().ok();
        }
        StreamChunk::Content(text) => {
            print!("{text}");
            std::io::stdout().flush().ok();
        }
        StreamChunk::Done => println!(),
        StreamChunk::Error(message) => {
            eprintln!("\n{}", style(format!("Error: {message}")).red());
        }
    }
}

pub(super) async fn cmd_chat(paths: &Paths, config: &GregConfig) -> greg_core::Result<i32> {
    let dispatcher = match Dispatcher::from_config(config, paths) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            ui::print_error("API error", &e);
            return Ok(1);
        }
    };

    let mut session = Session::new(Box::new(SystemClipboard));
    session.show();
    print_banner();
    print_offer(&session);

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        let active = session.state().active_commands.join(" ");
        let prompt = if active.is_empty() {
            "greg> ".to_string()
        } else {
            format!("greg {active}> ")
        };
        eprint!("{}", style(prompt).cyan());
        std::io::stderr().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };

        match ChatInput::parse(&line) {
            ChatInput::Quit => break,
            ChatInput::Reset => {
                session.show();
                ui::dim("Started over.");
                print_offer(&session);
                continue;
            }
            ChatInput::AcceptClipboard => {
                session.accept_clipboard_offer();
                match &session.state().context {
                    Some(_) => ui::dim("Clipboard attached."),
                    None => ui::dim("Nothing to attach."),
                }
                continue;
            }
            ChatInput::ClearContext => {
                session.clear_context();
                ui::dim("Context cleared.");
                continue;
            }
            ChatInput::Previous => {
                session.history_back();
                show_recalled(&session);
                continue;
            }
            ChatInput::Next => {
                session.history_forward();
                show_recalled(&session);
                continue;
            }
            ChatInput::Repeat => {
                let Some(last) = session.state().history.entries().last().cloned() else {
                    ui::dim("No previous prompt.");
                    continue;
                };
                session.load_entry(&last);
            }
            ChatInput::SubmitRecalled => {
                if session.state().input.is_empty() {
                    continue;
                }
            }
            ChatInput::Text(text) => {
                session.edit_input(&format!("{text} "));
                if session.state().input.is_empty() {
                    ui::dim(format!("Active: {}", session.state().active_commands.join(" ")));
                    continue;
                }
            }
        }

        let Some(pending) = session.submit() else {
            continue;
        };
        debug!(generation = pending.generation, "sending");
        let mut reported = false;
        drive(&dispatcher, &mut session, &pending, |chunk, _| {
            reported |= matches!(chunk, StreamChunk::Error(_));
            render(chunk);
        })
        .await;
        if !reported && let Some(message) = &session.state().error_message {
            eprintln!("{}", style(format!("Error: {message}")).red());
            if message_suggests_setup(message) {
                ui::dim(ui::SETUP_HINT);
            }
        }
    }

    Ok(0)
}

fn show_recalled(session: &Session) {
    let input = &session.state().input;
    if input.is_empty() {
        ui::dim("(empty)");
    } else {
        ui::dim(format!("↺ {input}"));
    }
}
