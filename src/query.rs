//! Query workflows.
//!
//! Select, select-from-selection, symbol lookup, call graph and map all
//! follow the same steps; [`QueryKind`] carries the per-kind parts (argument
//! builder, empty-result predicate, display strings) and [`QueryWorkflow`]
//! runs the shared procedure.

use crate::classify::{classify, describe_failure, FailureKind};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::indexer::{RecoveryOutcome, RecoveryWorkflow};
use crate::notify::{Notifier, ResultSink};
use crate::runner::{CommandFailure, ProcessRunner};
use crate::status::StatusReporter;
use crate::tool::ToolClient;
use crate::workspace::WorkspaceRoot;

/// Selection text is cut to this many characters before use as a query.
pub const SELECTION_QUERY_LIMIT: usize = 500;

/// Lowercase marker in `graph` output meaning the function has no edges.
pub const NO_CALL_RELATIONSHIPS_MARKER: &str = "no call relationships";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    SelectSelection,
    Symbol,
    CallGraph,
    Map,
}

impl QueryKind {
    pub fn title(&self) -> &'static str {
        match self {
            QueryKind::Select => "Context",
            QueryKind::SelectSelection => "Context for selection",
            QueryKind::Symbol => "Symbol",
            QueryKind::CallGraph => "Call graph",
            QueryKind::Map => "Repository map",
        }
    }

    fn status_text(&self) -> &'static str {
        match self {
            QueryKind::Select | QueryKind::SelectSelection => "codectx: selecting context",
            QueryKind::Symbol => "codectx: looking up symbol",
            QueryKind::CallGraph => "codectx: building call graph",
            QueryKind::Map => "codectx: mapping repository",
        }
    }

    /// Trims the raw input, truncating selections. Blank input is rejected
    /// before anything is launched.
    pub fn prepare_input(&self, raw: &str) -> Result<String> {
        let text = match self {
            QueryKind::SelectSelection => truncate_chars(raw, SELECTION_QUERY_LIMIT),
            _ => raw,
        }
        .trim();

        if text.is_empty() {
            return Err(BridgeError::InvalidInput(format!(
                "{} needs a non-empty query",
                self.title()
            )));
        }
        Ok(text.to_string())
    }

    /// Argument vector for this kind. `input` is always a single token.
    pub fn build_args(&self, input: &str, budget: u32) -> Vec<String> {
        match self {
            QueryKind::Select | QueryKind::SelectSelection => select_args(input, budget, false),
            QueryKind::Map => select_args(input, budget, true),
            QueryKind::Symbol => vec!["symbol".to_string(), input.to_string()],
            QueryKind::CallGraph => vec!["graph".to_string(), input.to_string()],
        }
    }

    pub fn is_empty_result(&self, stdout: &str) -> bool {
        if stdout.trim().is_empty() {
            return true;
        }
        matches!(self, QueryKind::CallGraph)
            && stdout.to_lowercase().contains(NO_CALL_RELATIONSHIPS_MARKER)
    }
}

fn select_args(query: &str, budget: u32, map: bool) -> Vec<String> {
    let mut args = vec![
        "select".to_string(),
        query.to_string(),
        "--budget".to_string(),
        budget.to_string(),
        "--format".to_string(),
        "markdown".to_string(),
    ];
    if map {
        args.push("--mode".to_string());
        args.push("map".to_string());
    }
    args
}

/// First `limit` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub kind: QueryKind,
    pub input: String,
    /// Overrides `defaultBudget` for select and map.
    pub budget: Option<u32>,
}

impl QueryRequest {
    pub fn new(kind: QueryKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            budget: None,
        }
    }

    pub fn select(query: impl Into<String>) -> Self {
        Self::new(QueryKind::Select, query)
    }

    pub fn selection(text: impl Into<String>) -> Self {
        Self::new(QueryKind::SelectSelection, text)
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Self::new(QueryKind::Symbol, name)
    }

    pub fn call_graph(function: impl Into<String>) -> Self {
        Self::new(QueryKind::CallGraph, function)
    }

    pub fn map(query: impl Into<String>) -> Self {
        Self::new(QueryKind::Map, query)
    }

    pub fn with_budget(mut self, budget: Option<u32>) -> Self {
        self.budget = budget;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Published { title: String, content: String },
    /// The tool succeeded but had nothing to return.
    Empty,
    NoWorkspace,
}

pub struct QueryWorkflow<'a, R> {
    pub tool: &'a ToolClient<R>,
    pub config: &'a BridgeConfig,
    pub status: &'a StatusReporter,
    pub notifier: &'a dyn Notifier,
    pub sink: &'a dyn ResultSink,
    pub recovery: RecoveryWorkflow<'a, R>,
}

impl<R: ProcessRunner> QueryWorkflow<'_, R> {
    pub async fn run(&self, root: Option<&WorkspaceRoot>, request: &QueryRequest) -> Result<QueryOutcome> {
        let Some(root) = root else {
            tracing::debug!(kind = ?request.kind, "no workspace open, skipping query");
            return Ok(QueryOutcome::NoWorkspace);
        };

        let kind = request.kind;
        let input = match kind.prepare_input(&request.input) {
            Ok(input) => input,
            Err(error) => {
                self.notifier.warn(&error.to_string());
                return Err(error);
            }
        };
        let budget = request.budget.unwrap_or(self.config.default_budget);
        let args = kind.build_args(&input, budget);

        match self.execute(root, kind, &input, &args).await {
            Ok(output) => Ok(self.deliver(kind, output)),
            Err(failure) => self.recover(root, kind, &input, &args, failure).await,
        }
    }

    /// Runs the tool once. `Ok(None)` is an empty result.
    async fn execute(
        &self,
        root: &WorkspaceRoot,
        kind: QueryKind,
        input: &str,
        args: &[String],
    ) -> std::result::Result<Option<String>, CommandFailure> {
        let _status = self.status.begin(kind.status_text(), input);
        tracing::debug!(kind = ?kind, root = %root, "running query");

        let stdout = self.tool.run(root, args.iter().cloned()).await.into_result()?;
        if kind.is_empty_result(&stdout) {
            Ok(None)
        } else {
            Ok(Some(stdout))
        }
    }

    fn deliver(&self, kind: QueryKind, output: Option<String>) -> QueryOutcome {
        match output {
            None => {
                self.notifier
                    .info(&format!("{}: no results", kind.title()));
                QueryOutcome::Empty
            }
            Some(content) => {
                self.sink.publish(kind.title(), &content);
                if self.config.show_notifications {
                    self.notifier
                        .info(&format!("{} ready and copied", kind.title()));
                }
                QueryOutcome::Published {
                    title: kind.title().to_string(),
                    content,
                }
            }
        }
    }

    /// NotInitialized is repaired in place: offer indexing, then retry once.
    async fn recover(
        &self,
        root: &WorkspaceRoot,
        kind: QueryKind,
        input: &str,
        args: &[String],
        failure: CommandFailure,
    ) -> Result<QueryOutcome> {
        if classify(&failure) != FailureKind::NotInitialized {
            return Err(self.report(kind, failure));
        }

        if !self
            .notifier
            .confirm("This workspace has not been indexed yet. Index it now?")
        {
            self.notifier
                .info("Indexing skipped. Run the index command when ready.");
            return Err(BridgeError::tool(kind.title(), failure));
        }

        let report = match self.recovery.ensure_indexed(root).await {
            Ok(report) => report,
            Err(error) => {
                self.notifier.error(&format!("Indexing failed: {}", error));
                return Err(error);
            }
        };

        if report.outcome == RecoveryOutcome::AlreadyRunning {
            self.notifier
                .warn("Indexing is already in progress. Try again when it finishes.");
            return Err(BridgeError::tool(kind.title(), failure));
        }

        tracing::info!(kind = ?kind, "workspace indexed, retrying query");
        match self.execute(root, kind, input, args).await {
            Ok(output) => Ok(self.deliver(kind, output)),
            Err(failure) => Err(self.report(kind, failure)),
        }
    }

    fn report(&self, kind: QueryKind, failure: CommandFailure) -> BridgeError {
        tracing::warn!(
            kind = ?kind,
            failure = classify(&failure).as_str(),
            exit_code = ?failure.exit_code,
            "query failed"
        );
        self.notifier
            .error(&describe_failure(self.tool.program(), kind.title(), &failure));
        BridgeError::tool(kind.title(), failure)
    }
}
