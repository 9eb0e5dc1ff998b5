//! Slash commands typed into the session input.
//!
//! A command activates once it is followed by a space. Activated commands
//! are removed from the text and remembered by the session until it resets.

/// Attach the clipboard as context.
pub const CLIPBOARD_COMMAND: &str = "/c";

/// Every command the session understands.
pub const KNOWN_COMMANDS: &[&str] = &[CLIPBOARD_COMMAND];

/// Detect completed commands in `input`.
///
/// Returns the input with activated commands removed, plus `already_active`
/// extended by the newly activated ones.
pub fn process_input(
    input: &str,
    known: &[&str],
    already_active: &[String],
) -> (String, Vec<String>) {
    let mut current = input.to_string();
    let mut active = already_active.to_vec();

    for &cmd in known {
        if active.iter().any(|a| a == cmd) {
            continue;
        }

        let with_space = format!("{cmd} ");
        let padded = format!(" {cmd} ");
        if current == with_space {
            current.clear();
        } else if let Some(rest) = current.strip_prefix(&with_space) {
            current = rest.to_string();
        } else if current.contains(&padded) {
            current = current.replace(&padded, " ");
        } else {
            continue;
        }
        active.push(cmd.to_string());
    }

    (trim_horizontal(&current).to_string(), active)
}

fn trim_horizontal(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() && c != '\n' && c != '\r')
}

/// Append streamed reasoning and keep only the last `max_lines` lines.
pub fn append_reasoning(current: &str, new_text: &str, max_lines: usize) -> String {
    let combined = format!("{current}{new_text}");
    let lines: Vec<&str> = combined.split('\n').collect();
    if lines.len() > max_lines {
        lines[lines.len() - max_lines..].join("\n")
    } else {
        combined
    }
}

/// History entry for a submission: active commands, then the raw input.
pub fn build_history_entry(raw_input: &str, active: &[String]) -> String {
    if active.is_empty() {
        raw_input.to_string()
    } else {
        format!("{} {raw_input}", active.join(" "))
    }
}

/// Commands that complete the partial `/word` at the end of `input`.
pub fn filter_commands<'a>(input: &str, known: &[&'a str], active: &[String]) -> Vec<&'a str> {
    let Some(slash) = input.rfind('/') else {
        return Vec::new();
    };
    let partial = &input[slash..];
    if partial.contains(' ') {
        return Vec::new();
    }
    known
        .iter()
        .copied()
        .filter(|cmd| !active.iter().any(|a| a == cmd))
        .filter(|cmd| partial == "/" || cmd.starts_with(partial))
        .collect()
}

/// Whether the command completion hint should be visible.
pub fn should_show_tooltip(input: &str, known: &[&str], active: &[String]) -> bool {
    !filter_commands(input, known, active).is_empty()
}
