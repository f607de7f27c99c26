//! Workspace root resolution.
//!
//! Having no workspace open is a normal state, not an error: resolvers
//! return `None` and every workflow turns that into a no-op.

pub mod detector;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};

pub use detector::{DetectedWorkspace, WorkspaceDetector, PROJECT_MARKERS};

/// Conventional source directory registered with `source add` when present.
pub const SOURCE_DIR: &str = "src";

/// Absolute path of the project the tool operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceRoot(PathBuf);

impl WorkspaceRoot {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let canonical = path.canonicalize()?;
        if !canonical.is_dir() {
            return Err(BridgeError::InvalidInput(format!(
                "workspace root {} is not a directory",
                path.display()
            )));
        }
        Ok(Self(canonical))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Whether `<root>/src` exists as a directory.
    pub fn has_source_dir(&self) -> bool {
        self.0.join(SOURCE_DIR).is_dir()
    }
}

impl AsRef<Path> for WorkspaceRoot {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for WorkspaceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

pub trait WorkspaceResolver: Send + Sync {
    fn resolve(&self) -> Option<WorkspaceRoot>;
}

/// A workspace chosen up front by the host, possibly none.
#[derive(Debug, Clone, Default)]
pub struct FixedWorkspace(Option<WorkspaceRoot>);

impl FixedWorkspace {
    pub fn open(root: WorkspaceRoot) -> Self {
        Self(Some(root))
    }

    pub fn none() -> Self {
        Self(None)
    }

    /// Paths that do not exist or are not directories resolve to no workspace.
    pub fn from_path(path: &Path) -> Self {
        match WorkspaceRoot::new(path) {
            Ok(root) => Self(Some(root)),
            Err(error) => {
                tracing::debug!(path = %path.display(), %error, "workspace path unusable");
                Self(None)
            }
        }
    }
}

impl WorkspaceResolver for FixedWorkspace {
    fn resolve(&self) -> Option<WorkspaceRoot> {
        self.0.clone()
    }
}
