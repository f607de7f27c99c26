//! Terminal implementations of the host surfaces.

use std::io::{BufRead, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use codectx_bridge::{Notifier, ResultSink, StatusSink, StatusState};

/// Spinner on stderr while a workflow is working; cleared when idle.
pub struct SpinnerStatusSink {
    bar: Mutex<Option<ProgressBar>>,
}

impl SpinnerStatusSink {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl StatusSink for SpinnerStatusSink {
    fn render(&self, state: &StatusState) {
        let mut bar = self.bar.lock().unwrap_or_else(PoisonError::into_inner);

        if !state.visible || state.is_idle() {
            if let Some(bar) = bar.take() {
                bar.finish_and_clear();
            }
            return;
        }

        let spinner = bar.get_or_insert_with(|| {
            let spinner = ProgressBar::new_spinner();
            let style = ProgressStyle::with_template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.enable_steady_tick(Duration::from_millis(100));
            spinner
        });

        if state.tooltip.is_empty() {
            spinner.set_message(state.text.clone());
        } else {
            spinner.set_message(format!("{} ({})", state.text, state.tooltip));
        }
    }
}

/// Notices on stderr; prompts read a y/N answer from stdin.
pub struct TerminalNotifier {
    assume_yes: bool,
}

impl TerminalNotifier {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Notifier for TerminalNotifier {
    fn info(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }

    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let stdin = std::io::stdin();
        if !stdin.is_terminal() {
            eprintln!("{} (use --yes to accept)", prompt);
            return false;
        }

        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();

        let mut answer = String::new();
        if stdin.lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Prints results to stdout and copies them to the system clipboard.
pub struct TerminalSink {
    clipboard: bool,
}

impl TerminalSink {
    pub fn new(clipboard: bool) -> Self {
        Self { clipboard }
    }
}

impl ResultSink for TerminalSink {
    fn publish(&self, title: &str, content: &str) {
        println!("{}", content.trim_end());

        if !self.clipboard {
            return;
        }
        let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(content));
        match copied {
            Ok(()) => tracing::debug!(title, bytes = content.len(), "result copied to clipboard"),
            Err(error) => tracing::warn!(%error, "could not copy result to clipboard"),
        }
    }
}
