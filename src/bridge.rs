//! Facade wiring configuration, tool client, session, status and host
//! surfaces into the user-facing entry points.

use std::sync::Arc;

use crate::classify::describe_failure;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::indexer::{check_readiness, ReadinessReport, RecoveryOutcome, RecoveryReport, RecoveryWorkflow};
use crate::notify::{DiscardSink, Notifier, ResultSink, TracingNotifier};
use crate::query::{QueryOutcome, QueryRequest, QueryWorkflow};
use crate::runner::ProcessRunner;
use crate::session::IndexingSession;
use crate::status::{StatusReporter, StatusSink};
use crate::tool::ToolClient;
use crate::workspace::{FixedWorkspace, WorkspaceResolver, WorkspaceRoot};

pub struct Bridge<R> {
    config: BridgeConfig,
    tool: ToolClient<R>,
    session: Arc<IndexingSession>,
    status: StatusReporter,
    resolver: Arc<dyn WorkspaceResolver>,
    notifier: Arc<dyn Notifier>,
    sink: Arc<dyn ResultSink>,
}

impl<R: ProcessRunner> Bridge<R> {
    /// Validates `config` (including the `cliPath` deny-list) before any
    /// process can be launched.
    pub fn new(config: BridgeConfig, runner: R) -> Result<Self> {
        config.validate()?;
        let tool = ToolClient::new(runner, &config.cli_path)?;
        Ok(Self {
            config,
            tool,
            session: Arc::new(IndexingSession::new()),
            status: StatusReporter::detached(),
            resolver: Arc::new(FixedWorkspace::none()),
            notifier: Arc::new(TracingNotifier),
            sink: Arc::new(DiscardSink),
        })
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn WorkspaceResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_status_sink(mut self, sink: Arc<dyn StatusSink>) -> Self {
        self.status = StatusReporter::new(sink);
        self
    }

    /// Shares an indexing session with other bridges in the process.
    pub fn with_session(mut self, session: Arc<IndexingSession>) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &IndexingSession {
        &self.session
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Resolves the current workspace. The status surface is hidden while
    /// no workspace is open and shows idle otherwise.
    pub fn resolve_workspace(&self) -> Option<WorkspaceRoot> {
        let root = self.resolver.resolve();
        match root {
            Some(_) => self.status.show_idle(),
            None => self.status.hide(),
        }
        root
    }

    fn recovery(&self) -> RecoveryWorkflow<'_, R> {
        RecoveryWorkflow::new(&self.tool, &self.session, &self.status)
    }

    fn notice(&self, message: &str) {
        if self.config.show_notifications {
            self.notifier.info(message);
        }
    }

    /// Runs one query workflow against the current workspace.
    pub async fn query(&self, request: QueryRequest) -> Result<QueryOutcome> {
        let root = self.resolve_workspace();
        if root.is_none() {
            self.notice("Open a workspace to query it.");
        }

        let workflow = QueryWorkflow {
            tool: &self.tool,
            config: &self.config,
            status: &self.status,
            notifier: self.notifier.as_ref(),
            sink: self.sink.as_ref(),
            recovery: self.recovery(),
        };
        workflow.run(root.as_ref(), &request).await
    }

    /// User-requested indexing. Every outcome is reported to the notifier.
    pub async fn index(&self) -> Result<RecoveryOutcome> {
        let root = self.resolve_workspace();
        let report = match self.recovery().ensure_indexed_in(root.as_ref()).await {
            Ok(report) => report,
            Err(error) => {
                self.notifier.error(&self.describe(&error));
                return Err(error);
            }
        };

        match &report.outcome {
            RecoveryOutcome::AlreadyRunning => {
                self.notifier.warn("Indexing is already in progress.");
            }
            RecoveryOutcome::NoWorkspace => self.notice("Open a workspace to index it."),
            RecoveryOutcome::AlreadyReady => self.notice("Workspace is already indexed."),
            RecoveryOutcome::Indexed { source, .. } => {
                self.notice(&format!("Workspace indexed (source: {}).", source))
            }
        }
        Ok(report.outcome)
    }

    /// Startup auto-check. Gated by `autoIndex`; failures are logged and
    /// never shown to the user.
    pub async fn startup(&self) -> Option<RecoveryReport> {
        if !self.config.auto_index {
            tracing::debug!("autoIndex disabled, skipping startup check");
            return None;
        }

        let root = self.resolve_workspace();
        match self.recovery().ensure_indexed_in(root.as_ref()).await {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::warn!(%error, "startup indexing check failed");
                None
            }
        }
    }

    /// Structured readiness report, `None` without a workspace.
    pub async fn check(&self) -> Result<Option<ReadinessReport>> {
        let Some(root) = self.resolve_workspace() else {
            self.notice("Open a workspace to check it.");
            return Ok(None);
        };

        let _status = self.status.begin("codectx: checking", "Running doctor");
        match check_readiness(&self.tool, &root).await {
            Ok(report) => Ok(Some(report)),
            Err(error) => {
                self.notifier.error(&self.describe(&error));
                Err(error)
            }
        }
    }

    /// Publishes the tool's human-readable `doctor` output.
    pub async fn show_status(&self) -> Result<QueryOutcome> {
        let Some(root) = self.resolve_workspace() else {
            self.notice("Open a workspace to show its status.");
            return Ok(QueryOutcome::NoWorkspace);
        };

        let output = {
            let _status = self.status.begin("codectx: checking", "Running doctor");
            self.tool.doctor(&root).await
        };

        match output {
            Ok(text) if text.trim().is_empty() => Ok(QueryOutcome::Empty),
            Ok(text) => {
                self.sink.publish("Status", &text);
                Ok(QueryOutcome::Published {
                    title: "Status".to_string(),
                    content: text,
                })
            }
            Err(failure) => {
                self.notifier
                    .error(&describe_failure(self.tool.program(), "doctor", &failure));
                Err(BridgeError::tool("doctor", failure))
            }
        }
    }

    fn describe(&self, error: &BridgeError) -> String {
        match error {
            BridgeError::Tool { stage, failure, .. } => {
                describe_failure(self.tool.program(), stage, failure)
            }
            other => other.to_string(),
        }
    }
}
