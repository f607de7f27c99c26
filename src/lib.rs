pub mod bridge;
pub mod classify;
pub mod config;
pub mod error;
pub mod indexer;
pub mod notify;
pub mod query;
pub mod runner;
pub mod session;
pub mod status;
pub mod tool;
pub mod workspace;

pub use bridge::Bridge;
pub use classify::{classify, describe_failure, FailureKind};
pub use config::{validate_cli_path, BridgeConfig, DEFAULT_BUDGET, DEFAULT_CLI_PATH};
pub use error::{BridgeError, Result};
pub use indexer::{
    check_readiness, source_path_for, CheckEntry, CheckStatus, ReadinessReport, RecoveryOutcome,
    RecoveryReport, RecoveryState, RecoveryWorkflow,
};
pub use notify::{DiscardSink, Notifier, ResultSink, TracingNotifier};
pub use query::{QueryKind, QueryOutcome, QueryRequest, QueryWorkflow, SELECTION_QUERY_LIMIT};
pub use runner::{CommandFailure, CommandInvocation, CommandOutcome, ProcessRunner, SystemRunner};
pub use session::{IndexingSession, SessionGuard};
pub use status::{NullStatusSink, StatusGuard, StatusReporter, StatusSink, StatusState};
pub use tool::ToolClient;
pub use workspace::{
    DetectedWorkspace, FixedWorkspace, WorkspaceDetector, WorkspaceResolver, WorkspaceRoot,
};
