//! Failure classification.
//!
//! The external tool reports problems as human-readable text on stderr.
//! Every marker this crate recognises lives in [`MARKERS`]; when the tool's
//! wording changes, this table is the only place to update.
//!
//! Matching is a case-insensitive substring search and can misfire: a
//! diagnostic that merely mentions "not found" is read as a missing tool.

use crate::runner::CommandFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotInitialized,
    ToolNotFound,
    InvalidInput,
    Unknown,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::NotInitialized => "not_initialized",
            FailureKind::ToolNotFound => "tool_not_found",
            FailureKind::InvalidInput => "invalid_input",
            FailureKind::Unknown => "unknown",
        }
    }
}

/// Marker strings per kind, checked in order. Lowercase.
pub const MARKERS: &[(FailureKind, &[&str])] = &[
    (
        FailureKind::NotInitialized,
        &[
            "not initialized",
            "not been initialized",
            "no index found",
            "run `codectx init`",
        ],
    ),
    (
        FailureKind::ToolNotFound,
        &["command not found", "not found", "no such file"],
    ),
    (
        FailureKind::InvalidInput,
        &[
            "missing required argument",
            "required arguments were not provided",
            "invalid argument",
            "invalid value",
            "unexpected argument",
        ],
    ),
];

pub fn classify(failure: &CommandFailure) -> FailureKind {
    if failure.exit_code.is_none() {
        return FailureKind::ToolNotFound;
    }

    let stderr = failure.stderr.to_lowercase();
    MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|marker| stderr.contains(marker)))
        .map(|(kind, _)| *kind)
        .unwrap_or(FailureKind::Unknown)
}

/// User-facing message for a failed step.
pub fn describe_failure(program: &str, stage: &str, failure: &CommandFailure) -> String {
    match classify(failure) {
        FailureKind::ToolNotFound => format!(
            "{} could not be run ({}). Install it or point `cliPath` at the executable.",
            program, failure
        ),
        FailureKind::NotInitialized => format!(
            "{} failed: the workspace has not been indexed yet. Run the index command first.",
            stage
        ),
        FailureKind::InvalidInput | FailureKind::Unknown => {
            format!("{} failed: {}", stage, failure)
        }
    }
}
