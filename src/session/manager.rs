use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide "indexing in progress" flag.
///
/// Shared by reference (or `Arc`) between every entry point that can start
/// an indexing run. Acquisition is a `compare_exchange`, so the guard stays
/// correct on a multi-threaded runtime.
#[derive(Debug, Default)]
pub struct IndexingSession {
    active: AtomicBool,
}

impl IndexingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Claims the session, or returns `None` when a run already holds it.
    pub fn try_acquire(&self) -> Option<SessionGuard<'_>> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SessionGuard { session: self })
    }
}

/// Releases the session when dropped, whichever way the run ends.
#[must_use = "the session is released as soon as the guard is dropped"]
#[derive(Debug)]
pub struct SessionGuard<'a> {
    session: &'a IndexingSession,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.active.store(false, Ordering::Release);
    }
}
