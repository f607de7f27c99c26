//! Argument vectors for the external tool's commands.

use crate::config::validate_cli_path;
use crate::error::Result;
use crate::runner::{CommandFailure, CommandInvocation, CommandOutcome, ProcessRunner};
use crate::workspace::WorkspaceRoot;

/// Typed front for the external tool. Holds a validated program string, so
/// no invocation can be built from a deny-listed `cliPath`.
pub struct ToolClient<R> {
    runner: R,
    program: String,
}

impl<R: ProcessRunner> ToolClient<R> {
    pub fn new(runner: R, cli_path: &str) -> Result<Self> {
        let program = validate_cli_path(cli_path)?;
        Ok(Self { runner, program })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn invocation<I, S>(&self, root: &WorkspaceRoot, args: I) -> CommandInvocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandInvocation::new(self.program.clone(), args, root.path())
    }

    pub async fn run<I, S>(&self, root: &WorkspaceRoot, args: I) -> CommandOutcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = self.invocation(root, args);
        self.runner.run(&invocation).await
    }

    /// `doctor --json`: structured readiness payload.
    pub async fn doctor_json(&self, root: &WorkspaceRoot) -> std::result::Result<String, CommandFailure> {
        self.run(root, ["doctor", "--json"]).await.into_result()
    }

    /// `doctor`: human-readable status text.
    pub async fn doctor(&self, root: &WorkspaceRoot) -> std::result::Result<String, CommandFailure> {
        self.run(root, ["doctor"]).await.into_result()
    }

    pub async fn init(&self, root: &WorkspaceRoot) -> std::result::Result<String, CommandFailure> {
        self.run(root, ["init"]).await.into_result()
    }

    /// `source add <path>`, with `path` relative to the workspace root.
    pub async fn source_add(
        &self,
        root: &WorkspaceRoot,
        path: &str,
    ) -> std::result::Result<String, CommandFailure> {
        self.run(root, ["source", "add", path]).await.into_result()
    }

    pub async fn index(&self, root: &WorkspaceRoot) -> std::result::Result<String, CommandFailure> {
        self.run(root, ["index"]).await.into_result()
    }
}
