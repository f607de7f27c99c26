//! Project root detection.

use std::path::{Path, PathBuf};

use super::{WorkspaceResolver, WorkspaceRoot};

/// Files or directories that mark a project root.
pub const PROJECT_MARKERS: &[&str] = &[
    ".git",
    ".codectx",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
    "go.mod",
];

/// Detects the project root enclosing a path
pub struct WorkspaceDetector;

impl WorkspaceDetector {
    /// Check whether a directory carries any project marker
    pub fn is_project_root(dir: &Path) -> bool {
        PROJECT_MARKERS.iter().any(|marker| dir.join(marker).exists())
    }

    /// Nearest ancestor of `start` (inclusive) that is a project root
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .find(|dir| Self::is_project_root(dir))
            .map(Path::to_path_buf)
    }
}

/// Resolves the project enclosing a starting directory, typically the
/// current working directory.
#[derive(Debug, Clone)]
pub struct DetectedWorkspace {
    start: PathBuf,
}

impl DetectedWorkspace {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }
}

impl WorkspaceResolver for DetectedWorkspace {
    fn resolve(&self) -> Option<WorkspaceRoot> {
        let root = WorkspaceDetector::find_root(&self.start)?;
        WorkspaceRoot::new(root).ok()
    }
}
