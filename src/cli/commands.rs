use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use codectx_bridge::{
    Bridge, BridgeConfig, BridgeError, DetectedWorkspace, FixedWorkspace,
    QueryRequest, ReadinessReport, SystemRunner, WorkspaceResolver,
};

use super::terminal::{SpinnerStatusSink, TerminalNotifier, TerminalSink};

#[derive(Parser)]
#[command(name = "codectx-bridge")]
#[command(about = "Drive the codectx indexing/search CLI with automatic workspace recovery")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Ranked context for a question, copied to the clipboard
    codectx-bridge select "auth flow"

    # Context for a code selection piped on stdin
    pbpaste | codectx-bridge selection

    # Look up a symbol or a call graph
    codectx-bridge symbol Config::load
    codectx-bridge graph ensure_indexed

    # Initialize and index the workspace if it is not ready
    codectx-bridge index

    # Show the readiness report
    codectx-bridge check --json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root (defaults to the project enclosing the current directory)
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Config file (defaults to .codectx-bridge.toml in the workspace)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured codectx executable
    #[arg(long, global = true)]
    pub cli_path: Option<String>,

    /// Answer yes to prompts (e.g. offer to index an uninitialized workspace)
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Do not copy published results to the clipboard
    #[arg(long, global = true)]
    pub no_clipboard: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Select ranked context for a query
    Select {
        /// Free-text query
        query: String,

        /// Token budget (defaults to defaultBudget)
        #[arg(long)]
        budget: Option<u32>,
    },

    /// Select context for a code selection (read from --file or stdin)
    Selection {
        /// File holding the selected text
        #[arg(long)]
        file: Option<PathBuf>,

        /// Token budget (defaults to defaultBudget)
        #[arg(long)]
        budget: Option<u32>,
    },

    /// Look up a symbol
    Symbol {
        /// Symbol name
        name: String,
    },

    /// Show the call graph of a function
    Graph {
        /// Function name
        function: String,
    },

    /// Build a repository map for a query
    Map {
        /// Free-text query
        query: String,

        /// Token budget (defaults to defaultBudget)
        #[arg(long)]
        budget: Option<u32>,
    },

    /// Initialize and index the workspace if it is not ready
    Index,

    /// Show the tool's human-readable status
    Status,

    /// Show the structured readiness report
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the startup auto-check (honours autoIndex, never prompts)
    Startup,
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let resolver: Arc<dyn WorkspaceResolver> = match &cli.workspace {
        Some(path) => Arc::new(FixedWorkspace::from_path(path)),
        None => Arc::new(DetectedWorkspace::new(std::env::current_dir()?)),
    };

    let workspace = resolver.resolve();
    let mut config = BridgeConfig::discover(cli.config.as_deref(), workspace.as_ref())?;
    if let Some(cli_path) = cli.cli_path {
        config.cli_path = cli_path;
    }

    let bridge = Bridge::new(config, SystemRunner)?
        .with_resolver(resolver)
        .with_notifier(Arc::new(TerminalNotifier::new(cli.yes)))
        .with_result_sink(Arc::new(TerminalSink::new(!cli.no_clipboard)))
        .with_status_sink(Arc::new(SpinnerStatusSink::new()));

    let result: Result<(), BridgeError> = match cli.command {
        Commands::Select { query, budget } => bridge
            .query(QueryRequest::select(query).with_budget(budget))
            .await
            .map(|_| ()),
        Commands::Selection { file, budget } => {
            let text = read_selection(file.as_deref())?;
            bridge
                .query(QueryRequest::selection(text).with_budget(budget))
                .await
                .map(|_| ())
        }
        Commands::Symbol { name } => bridge.query(QueryRequest::symbol(name)).await.map(|_| ()),
        Commands::Graph { function } => bridge
            .query(QueryRequest::call_graph(function))
            .await
            .map(|_| ()),
        Commands::Map { query, budget } => bridge
            .query(QueryRequest::map(query).with_budget(budget))
            .await
            .map(|_| ()),
        Commands::Index => bridge.index().await.map(|_| ()),
        Commands::Status => bridge.show_status().await.map(|_| ()),
        Commands::Check { json } => match bridge.check().await {
            Ok(Some(report)) => print_report(&report, json),
            Ok(None) => Ok(()),
            Err(error) => Err(error),
        },
        Commands::Startup => {
            if let Some(report) = bridge.startup().await {
                tracing::info!(outcome = ?report.outcome, transitions = ?report.transitions, "startup check finished");
            }
            Ok(())
        }
    };

    // Workflow errors have already been shown through the notifier.
    Ok(match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::debug!(%error, kind = error.kind().as_str(), "command failed");
            ExitCode::FAILURE
        }
    })
}

fn read_selection(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn print_report(report: &ReadinessReport, json: bool) -> Result<(), BridgeError> {
    if json {
        let output = serde_json::to_string_pretty(report)
            .map_err(|e| BridgeError::Readiness(e.to_string()))?;
        println!("{}", output);
        return Ok(());
    }

    println!("Readiness:");
    for entry in &report.entries {
        let marker = entry.status.as_str();
        match &entry.message {
            Some(message) => println!("  [{}] {}: {}", marker, entry.name, message),
            None => println!("  [{}] {}", marker, entry.name),
        }
    }
    println!(
        "\nWorkspace is {}",
        if report.is_ready() { "ready" } else { "not ready" }
    );
    Ok(())
}
