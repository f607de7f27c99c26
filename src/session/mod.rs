//! Single-flight guard for indexing runs.
//!
//! Only one recovery workflow may run at a time. A competing caller is
//! rejected immediately instead of being queued behind the active run.

pub mod manager;

pub use manager::{IndexingSession, SessionGuard};
