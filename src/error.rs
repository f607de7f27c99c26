use thiserror::Error;

use crate::classify::FailureKind;
use crate::runner::CommandFailure;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid cliPath {0:?}: shell metacharacters (; & | ` $) are not allowed")]
    InvalidCliPath(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} failed: {failure}")]
    Tool {
        stage: String,
        kind: FailureKind,
        failure: CommandFailure,
    },

    #[error("Readiness check failed: {0}")]
    Readiness(String),
}

impl BridgeError {
    /// Wraps a failed tool invocation, classifying it on the way.
    pub fn tool(stage: impl Into<String>, failure: CommandFailure) -> Self {
        let kind = crate::classify::classify(&failure);
        BridgeError::Tool {
            stage: stage.into(),
            kind,
            failure,
        }
    }

    /// Failure kind used to pick a remediation for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            BridgeError::Tool { kind, .. } => *kind,
            BridgeError::InvalidCliPath(_) | BridgeError::InvalidInput(_) => {
                FailureKind::InvalidInput
            }
            BridgeError::Io(_) | BridgeError::Config(_) | BridgeError::Readiness(_) => {
                FailureKind::Unknown
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
