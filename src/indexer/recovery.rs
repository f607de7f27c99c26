//! Recovery workflow: bring a workspace to a queryable state.
//!
//! ```text
//! Idle -> Checking -> Done                                      (ready)
//!                  -> Initializing -> AddingSource -> Indexing -> Done
//!         any step -> Failed
//! ```
//!
//! A run holds the [`IndexingSession`] for its whole duration. A second
//! request while one is active gets [`RecoveryOutcome::AlreadyRunning`] and
//! starts nothing.

use std::fmt;

use crate::error::{BridgeError, Result};
use crate::runner::ProcessRunner;
use crate::session::IndexingSession;
use crate::status::{StatusGuard, StatusReporter};
use crate::tool::ToolClient;
use crate::workspace::WorkspaceRoot;

use super::readiness::check_readiness;

const STATUS_TEXT: &str = "codectx: indexing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Idle,
    Checking,
    Initializing,
    AddingSource,
    Indexing,
    Done,
    Failed,
}

impl RecoveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryState::Idle => "idle",
            RecoveryState::Checking => "checking",
            RecoveryState::Initializing => "initializing",
            RecoveryState::AddingSource => "adding_source",
            RecoveryState::Indexing => "indexing",
            RecoveryState::Done => "done",
            RecoveryState::Failed => "failed",
        }
    }

    fn tooltip(&self) -> &'static str {
        match self {
            RecoveryState::Checking => "Checking workspace readiness",
            RecoveryState::Initializing => "Initializing workspace",
            RecoveryState::AddingSource => "Registering source directory",
            RecoveryState::Indexing => "Building index",
            RecoveryState::Idle | RecoveryState::Done | RecoveryState::Failed => "",
        }
    }
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Readiness check passed; nothing was changed.
    AlreadyReady,
    /// Workspace was initialized and indexed. `log` is the index output.
    Indexed { source: String, log: String },
    /// Another run holds the session.
    AlreadyRunning,
    /// No workspace is open.
    NoWorkspace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    pub outcome: RecoveryOutcome,
    /// States visited by this run, in order.
    pub transitions: Vec<RecoveryState>,
}

impl RecoveryReport {
    fn skipped(outcome: RecoveryOutcome) -> Self {
        Self {
            outcome,
            transitions: Vec::new(),
        }
    }
}

/// `./src` when the workspace has a `src` directory, `.` otherwise.
pub fn source_path_for(root: &WorkspaceRoot) -> &'static str {
    if root.has_source_dir() {
        "./src"
    } else {
        "."
    }
}

/// The session and status reporter are passed in rather than owned, so
/// every entry point that can start indexing shares the same guard.
pub struct RecoveryWorkflow<'a, R> {
    tool: &'a ToolClient<R>,
    session: &'a IndexingSession,
    status: &'a StatusReporter,
}

impl<'a, R: ProcessRunner> RecoveryWorkflow<'a, R> {
    pub fn new(
        tool: &'a ToolClient<R>,
        session: &'a IndexingSession,
        status: &'a StatusReporter,
    ) -> Self {
        Self {
            tool,
            session,
            status,
        }
    }

    /// Runs the workflow for an optional workspace. With no workspace the
    /// run is a no-op and the session is never touched.
    pub async fn ensure_indexed_in(&self, root: Option<&WorkspaceRoot>) -> Result<RecoveryReport> {
        match root {
            Some(root) => self.ensure_indexed(root).await,
            None => {
                tracing::debug!("no workspace open, skipping indexing");
                Ok(RecoveryReport::skipped(RecoveryOutcome::NoWorkspace))
            }
        }
    }

    pub async fn ensure_indexed(&self, root: &WorkspaceRoot) -> Result<RecoveryReport> {
        let Some(_session) = self.session.try_acquire() else {
            tracing::info!(root = %root, "indexing already in progress, request rejected");
            return Ok(RecoveryReport::skipped(RecoveryOutcome::AlreadyRunning));
        };

        let status = self
            .status
            .begin(STATUS_TEXT, RecoveryState::Checking.tooltip());
        let mut transitions = Vec::new();

        let result = self.drive(root, &status, &mut transitions).await;
        match &result {
            Ok(outcome) => {
                transitions.push(RecoveryState::Done);
                tracing::info!(root = %root, outcome = ?outcome, "workspace ready");
            }
            Err(error) => {
                transitions.push(RecoveryState::Failed);
                tracing::warn!(
                    root = %root,
                    %error,
                    transitions = ?transitions,
                    "indexing workflow failed"
                );
            }
        }

        result.map(|outcome| RecoveryReport {
            outcome,
            transitions,
        })
    }

    async fn drive(
        &self,
        root: &WorkspaceRoot,
        status: &StatusGuard<'_>,
        transitions: &mut Vec<RecoveryState>,
    ) -> Result<RecoveryOutcome> {
        enter(RecoveryState::Checking, status, transitions);
        match check_readiness(self.tool, root).await {
            Ok(report) if report.is_ready() => return Ok(RecoveryOutcome::AlreadyReady),
            Ok(report) => {
                let failing: Vec<&str> = report.failing().map(|e| e.name.as_str()).collect();
                tracing::info!(root = %root, failing = ?failing, "workspace not ready");
            }
            Err(error) => {
                tracing::info!(root = %root, %error, "readiness undetermined, initializing");
            }
        }

        enter(RecoveryState::Initializing, status, transitions);
        self.tool
            .init(root)
            .await
            .map_err(|failure| BridgeError::tool("init", failure))?;

        enter(RecoveryState::AddingSource, status, transitions);
        let source = source_path_for(root);
        self.tool
            .source_add(root, source)
            .await
            .map_err(|failure| BridgeError::tool("source add", failure))?;

        enter(RecoveryState::Indexing, status, transitions);
        let log = self
            .tool
            .index(root)
            .await
            .map_err(|failure| BridgeError::tool("index", failure))?;

        Ok(RecoveryOutcome::Indexed {
            source: source.to_string(),
            log,
        })
    }
}

fn enter(state: RecoveryState, status: &StatusGuard<'_>, transitions: &mut Vec<RecoveryState>) {
    tracing::debug!(state = %state, "recovery transition");
    status.update(STATUS_TEXT, state.tooltip());
    transitions.push(state);
}
