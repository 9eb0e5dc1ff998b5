use console::{style, Term};
use parking_lot::Mutex;
use std::io::{BufRead, BufReader, Stdin};
use tracing::debug;

use greg_config::{GregConfig, Paths};
use greg_core::GregError;
use greg_llm::Dispatcher;
use greg_runtime::pipeline::is_decline;
use greg_runtime::{CommandPipeline, Confirm, Outcome, ShellRunner};
use greg_safety::DangerRule;

use crate::ui;

/// Asks before a flagged command runs. The prompt goes to stderr and the
/// answer is read from `input`.
pub struct TerminalConfirm<R> {
    input: Mutex<R>,
}

impl TerminalConfirm<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(std::io::stdin()))
    }
}

impl<R: BufRead + Send> TerminalConfirm<R> {
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }
}

impl<R: BufRead + Send> Confirm for TerminalConfirm<R> {
    fn confirm(&self, _command: &str, rule: &DangerRule) -> greg_core::Result<bool> {
        debug!(rule = rule.name, category = %rule.category, "asking for confirmation");
        Term::stderr().write_str(&format!(
            "{} [{}/{}] ",
            style("⚠ This may modify files or have side effects. Run?").yellow(),
            style("Y").green(),
            style("n").red()
        ))?;
        let mut answer = String::new();
        self.input.lock().read_line(&mut answer)?;
        Ok(!is_decline(&answer))
    }
}

pub(super) async fn cmd_run(
    paths: &Paths,
    config: &GregConfig,
    prompt: &str,
) -> greg_core::Result<i32> {
    let dispatcher = match Dispatcher::from_config(config, paths) {
        Ok(dispatcher) => dispatcher,
        Err(e) => {
            ui::print_error("API error", &e);
            return Ok(1);
        }
    };
    let pipeline = CommandPipeline::new(dispatcher, paths);

    let spinner = ui::spinner("Thinking...");
    let generated = pipeline.generate(prompt).await;
    spinner.finish_and_clear();

    let command = match generated {
        Ok(generation) => {
            for skill in &generation.skills {
                eprintln!("{}", style(format!("  Using skill: {skill}")).green());
            }
            generation.command
        }
        Err(GregError::EmptyGeneration) => {
            eprintln!("{}", style("No command generated.").red());
            return Ok(1);
        }
        Err(e) => {
            ui::print_error("API error", &e);
            return Ok(1);
        }
    };

    ui::print_command(&command);

    let outcome = pipeline
        .execute(&command, &TerminalConfirm::stdin(), &ShellRunner::from_env())
        .await?;
    if outcome == Outcome::Declined {
        ui::dim("Aborted.");
    }
    Ok(outcome.exit_code())
}

#[cfg(test)]
mod tests {
    use super::*;
    use greg_safety::DangerClassifier;
    use std::io::Cursor;

    fn answer(input: &str) -> bool {
        let rule = DangerClassifier::new().classify("rm -rf /tmp/x").unwrap();
        TerminalConfirm::new(Cursor::new(input.as_bytes().to_vec()))
            .confirm("rm -rf /tmp/x", rule)
            .unwrap()
    }

    #[test]
    fn test_n_declines() {
        assert!(!answer("n\n"));
        assert!(!answer("  N  \n"));
    }

    #[test]
    fn test_enter_and_y_approve() {
        assert!(answer("\n"));
        assert!(answer("y\n"));
        assert!(answer("no\n"));
    }

    #[test]
    fn test_reads_one_answer_per_prompt() {
        let rule = DangerClassifier::new().classify("rm x").unwrap();
        let confirm = TerminalConfirm::new(Cursor::new(b"n\ny\n".to_vec()));
        assert!(!confirm.confirm("rm x", rule).unwrap());
        assert!(confirm.confirm("rm x", rule).unwrap());
    }
}
