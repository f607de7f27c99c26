//! Ephemeral status surface.
//!
//! The reporter owns the current state and pushes every change to a
//! [`StatusSink`]. Workflows hold a [`StatusGuard`] while they work. Guards
//! stack: the most recently started one is shown, and dropping a guard
//! brings back whatever its predecessors are showing, so a short query that
//! finishes during an indexing run cannot blank the indexing indicator.
//! The surface returns to its base state (idle or hidden) only once every
//! guard is gone, including guards dropped by early returns and errors.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const IDLE_TEXT: &str = "codectx";
pub const IDLE_TOOLTIP: &str = "codectx: idle";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusState {
    pub visible: bool,
    pub text: String,
    pub tooltip: String,
}

impl StatusState {
    pub fn idle() -> Self {
        Self {
            visible: true,
            text: IDLE_TEXT.to_string(),
            tooltip: IDLE_TOOLTIP.to_string(),
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::idle()
        }
    }

    fn working(text: String, tooltip: String) -> Self {
        Self {
            visible: true,
            text,
            tooltip,
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::idle()
    }
}

/// Renders status changes, e.g. a terminal spinner or an editor status bar.
pub trait StatusSink: Send + Sync {
    fn render(&self, state: &StatusState);
}

pub struct NullStatusSink;

impl StatusSink for NullStatusSink {
    fn render(&self, _state: &StatusState) {}
}

struct Surface {
    /// Shown when no guard is active.
    base: StatusState,
    /// Active guards in start order.
    active: Vec<(u64, StatusState)>,
    next_id: u64,
    shown: StatusState,
}

impl Surface {
    fn current(&self) -> &StatusState {
        self.active
            .last()
            .map(|(_, state)| state)
            .unwrap_or(&self.base)
    }

    /// Records the state that should now be shown, if it changed.
    fn refresh(&mut self) -> Option<StatusState> {
        if *self.current() == self.shown {
            return None;
        }
        self.shown = self.current().clone();
        Some(self.shown.clone())
    }
}

pub struct StatusReporter {
    surface: Mutex<Surface>,
    sink: Arc<dyn StatusSink>,
}

impl StatusReporter {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self {
            surface: Mutex::new(Surface {
                base: StatusState::idle(),
                active: Vec::new(),
                next_id: 0,
                shown: StatusState::idle(),
            }),
            sink,
        }
    }

    /// Reporter without a rendering surface.
    pub fn detached() -> Self {
        Self::new(Arc::new(NullStatusSink))
    }

    pub fn snapshot(&self) -> StatusState {
        self.lock().shown.clone()
    }

    /// Number of workflows currently holding a guard.
    pub fn active(&self) -> usize {
        self.lock().active.len()
    }

    /// Makes idle the base state. Active guards keep showing until dropped.
    pub fn show_idle(&self) {
        self.change(|surface| surface.base = StatusState::idle());
    }

    /// Hides the surface once no guard is active, e.g. with no workspace open.
    pub fn hide(&self) {
        self.change(|surface| surface.base = StatusState::hidden());
    }

    /// Shows a working state until the returned guard is dropped.
    pub fn begin(&self, text: impl Into<String>, tooltip: impl Into<String>) -> StatusGuard<'_> {
        let state = StatusState::working(text.into(), tooltip.into());
        let mut id = 0;
        self.change(|surface| {
            id = surface.next_id;
            surface.next_id += 1;
            surface.active.push((id, state));
        });
        StatusGuard { reporter: self, id }
    }

    fn lock(&self) -> MutexGuard<'_, Surface> {
        self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `edit` and renders the result outside the lock.
    fn change(&self, edit: impl FnOnce(&mut Surface)) {
        let rendered = {
            let mut surface = self.lock();
            edit(&mut surface);
            surface.refresh()
        };
        if let Some(state) = rendered {
            self.sink.render(&state);
        }
    }
}

#[must_use = "the status is restored as soon as the guard is dropped"]
pub struct StatusGuard<'a> {
    reporter: &'a StatusReporter,
    id: u64,
}

impl StatusGuard<'_> {
    /// Replaces this guard's state. Shown only while it is the newest guard.
    pub fn update(&self, text: impl Into<String>, tooltip: impl Into<String>) {
        let state = StatusState::working(text.into(), tooltip.into());
        self.reporter.change(|surface| {
            if let Some(entry) = surface.active.iter_mut().find(|(id, _)| *id == self.id) {
                entry.1 = state;
            }
        });
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        let id = self.id;
        self.reporter
            .change(|surface| surface.active.retain(|(active, _)| *active != id));
    }
}
