//! Seams to the host's user-facing surfaces.

/// Messages and prompts shown to the user.
pub trait Notifier: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    /// Asks a yes/no question. Hosts that cannot prompt answer `false`.
    fn confirm(&self, prompt: &str) -> bool;
}

/// Where published query results go: a display plus a clipboard-like sink.
pub trait ResultSink: Send + Sync {
    fn publish(&self, title: &str, content: &str);
}

/// Routes notices to the log and declines every prompt.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, "no interactive surface, declining prompt");
        false
    }
}

pub struct DiscardSink;

impl ResultSink for DiscardSink {
    fn publish(&self, title: &str, content: &str) {
        tracing::debug!(title, bytes = content.len(), "result discarded");
    }
}
