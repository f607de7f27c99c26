//! Integration tests for the query workflows driven through the bridge.

mod common;

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::Notify;

use codectx_bridge::{
    Bridge, BridgeConfig, BridgeError, FailureKind, FixedWorkspace, QueryOutcome, QueryRequest,
    RecoveryOutcome, StatusState, WorkspaceRoot, SELECTION_QUERY_LIMIT,
};

use common::{
    Notice, RecordingNotifier, RecordingSink, RecordingStatus, ScriptedRunner, NOT_READY,
};

const NOT_INITIALIZED: &str = "error: workspace not initialized, run `codectx init`";

struct Harness {
    _temp_dir: TempDir,
    runner: Arc<ScriptedRunner>,
    notifier: Arc<RecordingNotifier>,
    sink: Arc<RecordingSink>,
    status: Arc<RecordingStatus>,
    bridge: Bridge<Arc<ScriptedRunner>>,
}

impl Harness {
    fn new(notifier: Arc<RecordingNotifier>) -> Self {
        Self::with_config(BridgeConfig::default(), notifier)
    }

    fn with_config(config: BridgeConfig, notifier: Arc<RecordingNotifier>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("src")).expect("Failed to create src");
        let root = WorkspaceRoot::new(temp_dir.path()).expect("Failed to open workspace");

        let runner = ScriptedRunner::new();
        let sink = RecordingSink::new();
        let status = RecordingStatus::new();
        let bridge = Bridge::new(config, runner.clone())
            .expect("config is valid")
            .with_resolver(Arc::new(FixedWorkspace::open(root)))
            .with_notifier(notifier.clone())
            .with_result_sink(sink.clone())
            .with_status_sink(status.clone());

        Self {
            _temp_dir: temp_dir,
            runner,
            notifier,
            sink,
            status,
            bridge,
        }
    }

    fn assert_settled(&self) {
        assert!(self.bridge.status().snapshot().is_idle());
        if let Some(last) = self.status.states().last() {
            assert!(last.is_idle(), "status left at {:?}", last);
        }
        assert!(!self.bridge.session().is_active());
    }
}

#[tokio::test]
async fn test_no_workspace_launches_nothing() {
    let runner = ScriptedRunner::new();
    let sink = RecordingSink::new();
    let bridge = Bridge::new(BridgeConfig::default(), runner.clone())
        .expect("default config is valid")
        .with_resolver(Arc::new(FixedWorkspace::none()))
        .with_result_sink(sink.clone());

    for request in [
        QueryRequest::select("auth"),
        QueryRequest::symbol("main"),
        QueryRequest::call_graph("main"),
    ] {
        let outcome = bridge.query(request).await.expect("no workspace is not an error");
        assert_eq!(outcome, QueryOutcome::NoWorkspace);
    }
    assert!(runner.calls().is_empty());
    assert!(sink.published().is_empty());
}

#[tokio::test]
async fn test_no_workspace_hides_status() {
    let runner = ScriptedRunner::new();
    let status = RecordingStatus::new();
    let bridge = Bridge::new(BridgeConfig::default(), runner.clone())
        .expect("default config is valid")
        .with_resolver(Arc::new(FixedWorkspace::none()))
        .with_status_sink(status.clone());

    bridge
        .query(QueryRequest::symbol("main"))
        .await
        .expect("no workspace is not an error");

    assert_eq!(bridge.status().snapshot(), StatusState::hidden());
    assert_eq!(status.states(), vec![StatusState::hidden()]);
}

#[tokio::test]
async fn test_query_during_indexing_keeps_indexing_status() {
    let harness = Harness::new(RecordingNotifier::accepting());
    let gate = Arc::new(Notify::new());
    harness
        .runner
        .succeed(&["doctor", "--json"], NOT_READY)
        .succeed(&["select"], "## auth")
        .hold(&["index"], gate.clone());

    let query_while_indexing = async {
        while harness.runner.calls().len() < 4 {
            tokio::task::yield_now().await;
        }
        let outcome = harness.bridge.query(QueryRequest::select("auth")).await;
        let during = harness.bridge.status().snapshot();
        let session_active = harness.bridge.session().is_active();
        gate.notify_one();
        (outcome, during, session_active)
    };

    let (indexed, (outcome, during, session_active)) =
        tokio::join!(harness.bridge.index(), query_while_indexing);

    assert!(matches!(
        indexed.expect("indexing should succeed"),
        RecoveryOutcome::Indexed { .. }
    ));
    assert!(matches!(
        outcome.expect("query should succeed"),
        QueryOutcome::Published { .. }
    ));
    assert!(session_active);
    assert_eq!(during.text, "codectx: indexing");
    assert_eq!(during.tooltip, "Building index");
    harness.assert_settled();
}

#[tokio::test]
async fn test_indexing_finishing_mid_query_keeps_query_status() {
    let harness = Harness::new(RecordingNotifier::accepting());
    let gate = Arc::new(Notify::new());
    harness
        .runner
        .succeed(&["doctor", "--json"], NOT_READY)
        .succeed(&["symbol"], "fn main()")
        .hold(&["symbol"], gate.clone());

    let index_while_querying = async {
        while harness.runner.calls().is_empty() {
            tokio::task::yield_now().await;
        }
        let indexed = harness.bridge.index().await;
        let during = harness.bridge.status().snapshot();
        gate.notify_one();
        (indexed, during)
    };

    let (outcome, (indexed, during)) = tokio::join!(
        harness.bridge.query(QueryRequest::symbol("main")),
        index_while_querying
    );

    outcome.expect("symbol lookup should succeed");
    indexed.expect("indexing should succeed");
    assert_eq!(during.text, "codectx: looking up symbol");
    assert_eq!(during.tooltip, "main");
    harness.assert_settled();
}

#[tokio::test]
async fn test_select_publishes_result() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness
        .runner
        .succeed(&["select"], "## auth\nfn login() {}\n");

    let outcome = harness
        .bridge
        .query(QueryRequest::select("auth flow"))
        .await
        .expect("select should succeed");

    assert_eq!(
        harness.runner.call_lines(),
        vec!["select auth flow --budget 8000 --format markdown"]
    );
    assert_eq!(
        harness.sink.published(),
        vec![("Context".to_string(), "## auth\nfn login() {}\n".to_string())]
    );
    assert!(matches!(outcome, QueryOutcome::Published { .. }));
    assert!(harness
        .notifier
        .notices()
        .contains(&Notice::Info("Context ready and copied".to_string())));
    harness.assert_settled();
}

#[tokio::test]
async fn test_success_notice_gated_by_config() {
    let config = BridgeConfig {
        show_notifications: false,
        default_budget: 1200,
        ..BridgeConfig::default()
    };
    let harness = Harness::with_config(config, RecordingNotifier::accepting());
    harness.runner.succeed(&["select"], "content");

    harness
        .bridge
        .query(QueryRequest::map("overview"))
        .await
        .expect("map should succeed");

    assert_eq!(
        harness.runner.call_lines(),
        vec!["select overview --budget 1200 --format markdown --mode map"]
    );
    assert_eq!(harness.sink.published().len(), 1);
    assert!(harness.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_explicit_budget_overrides_default() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(&["select"], "content");

    harness
        .bridge
        .query(QueryRequest::select("auth").with_budget(Some(300)))
        .await
        .expect("select should succeed");

    assert_eq!(
        harness.runner.call_lines(),
        vec!["select auth --budget 300 --format markdown"]
    );
}

#[tokio::test]
async fn test_empty_output_is_reported_not_published() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(&["symbol"], "  \n");

    let outcome = harness
        .bridge
        .query(QueryRequest::symbol("Missing"))
        .await
        .expect("empty result is not an error");

    assert_eq!(outcome, QueryOutcome::Empty);
    assert!(harness.sink.published().is_empty());
    assert_eq!(
        harness.notifier.notices(),
        vec![Notice::Info("Symbol: no results".to_string())]
    );
    harness.assert_settled();
}

#[tokio::test]
async fn test_graph_without_edges_is_empty() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness
        .runner
        .succeed(&["graph"], "No call relationships found for `main`\n");

    let outcome = harness
        .bridge
        .query(QueryRequest::call_graph("main"))
        .await
        .expect("empty graph is not an error");

    assert_eq!(outcome, QueryOutcome::Empty);
    assert_eq!(harness.runner.call_lines(), vec!["graph main"]);
    assert!(harness.sink.published().is_empty());
}

#[tokio::test]
async fn test_metacharacters_stay_in_one_argument() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(&["select"], "content");
    let query = "x; rm -rf ~ && echo $(id) | `whoami`";

    harness
        .bridge
        .query(QueryRequest::select(query))
        .await
        .expect("select should succeed");

    let calls = harness.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].args()[1], query);
    assert_eq!(calls[0].args().len(), 6);
}

#[tokio::test]
async fn test_selection_is_truncated() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(&["select"], "content");
    let selection = "ß".repeat(SELECTION_QUERY_LIMIT * 2);

    let outcome = harness
        .bridge
        .query(QueryRequest::selection(selection))
        .await
        .expect("selection should succeed");

    let calls = harness.runner.calls();
    assert_eq!(calls[0].args()[1].chars().count(), SELECTION_QUERY_LIMIT);
    assert!(matches!(
        outcome,
        QueryOutcome::Published { ref title, .. } if title == "Context for selection"
    ));
}

#[tokio::test]
async fn test_blank_input_is_rejected_before_launch() {
    let harness = Harness::new(RecordingNotifier::accepting());

    let error = harness
        .bridge
        .query(QueryRequest::symbol("   "))
        .await
        .expect_err("blank symbol must be rejected");

    assert!(matches!(error, BridgeError::InvalidInput(_)));
    assert!(harness.runner.calls().is_empty());
}

#[tokio::test]
async fn test_metacharacter_cli_path_is_refused() {
    let runner = ScriptedRunner::new();
    let config = BridgeConfig {
        cli_path: "codectx; rm -rf /".to_string(),
        ..BridgeConfig::default()
    };

    let result = Bridge::new(config, runner.clone());

    assert!(matches!(result, Err(BridgeError::InvalidCliPath(_))));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_not_initialized_offers_indexing_and_retries() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness
        .runner
        .fail(&["select"], 1, NOT_INITIALIZED)
        .succeed(&["select"], "## result")
        .succeed(&["doctor", "--json"], NOT_READY);

    let outcome = harness
        .bridge
        .query(QueryRequest::select("auth"))
        .await
        .expect("query should succeed after indexing");

    assert_eq!(
        harness.runner.call_lines(),
        vec![
            "select auth --budget 8000 --format markdown",
            "doctor --json",
            "init",
            "source add ./src",
            "index",
            "select auth --budget 8000 --format markdown",
        ]
    );
    assert_eq!(harness.notifier.prompts(), 1);
    assert_eq!(
        outcome,
        QueryOutcome::Published {
            title: "Context".to_string(),
            content: "## result".to_string(),
        }
    );
    harness.assert_settled();
}

#[tokio::test]
async fn test_declined_indexing_runs_nothing_else() {
    let harness = Harness::new(RecordingNotifier::declining());
    harness.runner.fail(&["symbol"], 1, NOT_INITIALIZED);

    let error = harness
        .bridge
        .query(QueryRequest::symbol("main"))
        .await
        .expect_err("declined indexing leaves the query failed");

    assert_eq!(error.kind(), FailureKind::NotInitialized);
    assert_eq!(harness.runner.call_lines(), vec!["symbol main"]);
    assert_eq!(harness.notifier.prompts(), 1);
    assert!(harness.notifier.errors().is_empty());
    harness.assert_settled();
}

#[tokio::test]
async fn test_retry_happens_only_once() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness
        .runner
        .fail(&["graph"], 1, NOT_INITIALIZED)
        .succeed(&["doctor", "--json"], NOT_READY);

    let error = harness
        .bridge
        .query(QueryRequest::call_graph("main"))
        .await
        .expect_err("still uninitialized after indexing");

    assert_eq!(error.kind(), FailureKind::NotInitialized);
    let graph_calls = harness
        .runner
        .call_lines()
        .into_iter()
        .filter(|line| line.starts_with("graph"))
        .count();
    assert_eq!(graph_calls, 2);
    assert_eq!(harness.notifier.prompts(), 1);
    assert_eq!(harness.notifier.errors().len(), 1);
    harness.assert_settled();
}

#[tokio::test]
async fn test_missing_tool_gets_install_hint() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.respond(
        &["select"],
        codectx_bridge::CommandOutcome::Failure(codectx_bridge::CommandFailure::launch(
            "codectx",
            &std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
        )),
    );

    let error = harness
        .bridge
        .query(QueryRequest::select("auth"))
        .await
        .expect_err("missing tool must fail");

    assert_eq!(error.kind(), FailureKind::ToolNotFound);
    let errors = harness.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("cliPath"), "no hint in {:?}", errors[0]);
    assert_eq!(harness.notifier.prompts(), 0);
    harness.assert_settled();
}

#[tokio::test]
async fn test_unknown_failure_shows_stderr() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.fail(&["symbol"], 101, "thread 'main' panicked");

    let error = harness
        .bridge
        .query(QueryRequest::symbol("main"))
        .await
        .expect_err("tool crash must fail");

    assert_eq!(error.kind(), FailureKind::Unknown);
    let errors = harness.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("thread 'main' panicked"));
    harness.assert_settled();
}

#[tokio::test]
async fn test_show_status_publishes_doctor_text() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(&["doctor"], "index: ok\nconfig: ok\n");

    let outcome = harness
        .bridge
        .show_status()
        .await
        .expect("doctor should succeed");

    assert_eq!(harness.runner.call_lines(), vec!["doctor"]);
    assert!(matches!(outcome, QueryOutcome::Published { .. }));
    assert_eq!(harness.sink.published()[0].0, "Status");
    harness.assert_settled();
}

#[tokio::test]
async fn test_check_returns_structured_report() {
    let harness = Harness::new(RecordingNotifier::accepting());
    harness.runner.succeed(
        &["doctor", "--json"],
        r#"{"checks":[{"name":"index","status":"error","message":"missing"}]}"#,
    );

    let report = harness
        .bridge
        .check()
        .await
        .expect("doctor should parse")
        .expect("workspace is open");

    assert!(!report.is_ready());
    assert_eq!(report.failing().count(), 1);
    harness.assert_settled();
}
