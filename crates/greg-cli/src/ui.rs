//! Terminal output helpers. Everything goes to stderr so stdout belongs to
//! the commands greg runs.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use greg_core::GregError;

const RULE: &str = "─────────────────────────────────────────";

/// Printed after errors that setup is likely to fix.
pub const SETUP_HINT: &str = "Run `greg --setup` to reconfigure.";

/// Show a command between two rules.
pub fn print_command(command: &str) {
    eprintln!();
    eprintln!("{}", style(RULE).dim());
    eprintln!("  {}", style(command).green().bold());
    eprintln!("{}", style(RULE).dim());
    eprintln!();
}

/// Steady spinner on stderr until the caller clears it.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(s) = ProgressStyle::default_spinner().template("  {spinner:.dim} {msg:.dim}") {
        pb.set_style(s);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Unstyled lines reported for a failed request.
pub fn error_report(prefix: &str, err: &GregError) -> Vec<String> {
    let mut lines = vec![format!("{prefix}: {err}")];
    if err.needs_reconfiguration() {
        lines.push(SETUP_HINT.to_string());
    }
    lines
}

/// Print [`error_report`], message in red and hint dimmed.
pub fn print_error(prefix: &str, err: &GregError) {
    let mut lines = error_report(prefix, err).into_iter();
    if let Some(first) = lines.next() {
        eprintln!("\n{}", style(first).red());
    }
    for line in lines {
        eprintln!("{}", style(line).dim());
    }
}

pub fn dim(message: impl std::fmt::Display) {
    eprintln!("{}", style(message).dim());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_get_setup_hint() {
        let err = GregError::Provider("HTTP 401: unauthorized".into());
        assert_eq!(
            error_report("API error", &err),
            vec!["API error: HTTP 401: unauthorized".to_string(), SETUP_HINT.to_string()]
        );

        let err = GregError::Bridge("unavailable:modelNotReady".into());
        assert_eq!(error_report("API error", &err).len(), 2);
    }

    #[test]
    fn test_other_errors_have_no_hint() {
        let err = GregError::Provider("HTTP 529: overloaded".into());
        assert_eq!(
            error_report("API error", &err),
            vec!["API error: HTTP 529: overloaded".to_string()]
        );
    }
}
