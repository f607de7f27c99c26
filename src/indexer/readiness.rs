//! Readiness check over `doctor --json`.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::runner::ProcessRunner;
use crate::tool::ToolClient;
use crate::workspace::WorkspaceRoot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Ok => "ok",
            CheckStatus::Warning => "warning",
            CheckStatus::Error => "error",
        }
    }
}

/// One line of the doctor report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckEntry {
    pub name: String,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub entries: Vec<CheckEntry>,
}

/// Payload shapes the doctor command is known to emit.
#[derive(Deserialize)]
#[serde(untagged)]
enum DoctorPayload {
    Entries(Vec<CheckEntry>),
    Wrapped { checks: Vec<CheckEntry> },
}

impl ReadinessReport {
    pub fn new(entries: Vec<CheckEntry>) -> Self {
        Self { entries }
    }

    /// Parses a doctor payload. A malformed payload is an error, never an
    /// empty (and therefore "ready") report.
    pub fn parse(payload: &str) -> Result<Self> {
        let parsed: DoctorPayload = serde_json::from_str(payload.trim()).map_err(|e| {
            BridgeError::Readiness(format!("malformed doctor payload: {}", e))
        })?;

        let entries = match parsed {
            DoctorPayload::Entries(entries) => entries,
            DoctorPayload::Wrapped { checks } => checks,
        };
        Ok(Self { entries })
    }

    /// Ready iff no entry reports `error`; warnings do not block.
    pub fn is_ready(&self) -> bool {
        !self
            .entries
            .iter()
            .any(|entry| entry.status == CheckStatus::Error)
    }

    pub fn failing(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == CheckStatus::Error)
    }
}

pub async fn check_readiness<R: ProcessRunner>(
    tool: &ToolClient<R>,
    root: &WorkspaceRoot,
) -> Result<ReadinessReport> {
    let payload = tool
        .doctor_json(root)
        .await
        .map_err(|failure| BridgeError::tool("doctor --json", failure))?;

    let report = ReadinessReport::parse(&payload)?;
    tracing::debug!(
        root = %root,
        entries = report.entries.len(),
        ready = report.is_ready(),
        "readiness checked"
    );
    Ok(report)
}
