//! Operator configuration.
//!
//! Read from TOML using the same camelCase keys the editor settings use:
//!
//! ```toml
//! cliPath = "codectx"
//! defaultBudget = 8000
//! autoIndex = true
//! showNotifications = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::workspace::WorkspaceRoot;

pub const DEFAULT_CLI_PATH: &str = "codectx";
pub const DEFAULT_BUDGET: u32 = 8000;

/// Workspace-local configuration file name.
pub const WORKSPACE_CONFIG_FILE: &str = ".codectx-bridge.toml";

static SHELL_METACHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[;&|`$]").expect("deny-list pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Executable name or path of the external tool.
    pub cli_path: String,
    /// Token ceiling passed to `select --budget`.
    pub default_budget: u32,
    /// Run the recovery workflow unprompted at startup.
    pub auto_index: bool,
    /// Gates passive success notices. Failures are always reported.
    pub show_notifications: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            cli_path: DEFAULT_CLI_PATH.to_string(),
            default_budget: DEFAULT_BUDGET,
            auto_index: true,
            show_notifications: true,
        }
    }
}

impl BridgeConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BridgeConfig = toml::from_str(content)
            .map_err(|e: toml::de::Error| BridgeError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Picks the config source: an explicit file wins, then the workspace
    /// file, then built-in defaults.
    pub fn discover(explicit: Option<&Path>, workspace: Option<&WorkspaceRoot>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading explicit config");
            return Self::load(path);
        }

        if let Some(path) = workspace.map(Self::workspace_file).filter(|p| p.is_file()) {
            tracing::debug!(path = %path.display(), "loading workspace config");
            return Self::load(&path);
        }

        Ok(Self::default())
    }

    pub fn workspace_file(root: &WorkspaceRoot) -> PathBuf {
        root.path().join(WORKSPACE_CONFIG_FILE)
    }

    pub fn validate(&self) -> Result<()> {
        validate_cli_path(&self.cli_path)?;
        if self.default_budget == 0 {
            return Err(BridgeError::Config(
                "defaultBudget must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Checks the configured program string before it can reach a process
/// spawn. Returns the trimmed value.
pub fn validate_cli_path(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(BridgeError::Config("cliPath must not be empty".to_string()));
    }
    if SHELL_METACHARACTERS.is_match(trimmed) {
        return Err(BridgeError::InvalidCliPath(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}
