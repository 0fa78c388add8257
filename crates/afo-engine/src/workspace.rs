//! Workspace abstraction
//!
//! The engine operates on a file-tree root through path-based read, write,
//! and list operations; storage mechanics stay behind the [`Workspace`]
//! trait. All paths crossing the trait boundary are workspace-relative, and
//! relative paths that would escape the root are rejected.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Errors from workspace operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    /// Path is absolute or escapes the workspace root
    #[error("path escapes workspace root: {path}")]
    OutsideRoot {
        /// Offending path
        path: PathBuf,
    },

    /// Underlying I/O failure
    #[error("workspace I/O error at {path}: {source}")]
    Io {
        /// Workspace-relative path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// One directory entry from [`Workspace::list`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    /// Workspace-relative path of the entry
    pub path: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
}

/// Path-based view of the tree the pipeline operates on.
///
/// Detectors receive this read-only by contract; fixers may write but must
/// stay inside the root and defensively honor policy exclusions.
#[async_trait]
pub trait Workspace: Send + Sync {
    /// Absolute root of the workspace
    fn root(&self) -> &Path;

    /// Read a UTF-8 file at a workspace-relative path
    async fn read(&self, path: &Path) -> Result<String, WorkspaceError>;

    /// Write a UTF-8 file at a workspace-relative path, creating parents
    async fn write(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError>;

    /// Whether a workspace-relative path exists
    async fn exists(&self, path: &Path) -> bool;

    /// List direct children of a workspace-relative directory
    async fn list(&self, dir: &Path) -> Result<Vec<WorkspaceEntry>, WorkspaceError>;
}

/// Reject absolute paths and `..` traversal before touching the filesystem.
fn ensure_relative(path: &Path) -> Result<(), WorkspaceError> {
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
    if escapes {
        return Err(WorkspaceError::OutsideRoot {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Production workspace backed by the local filesystem
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Create a workspace rooted at the given directory
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf, WorkspaceError> {
        ensure_relative(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl Workspace for FsWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn read(&self, path: &Path) -> Result<String, WorkspaceError> {
        let abs = self.absolute(path)?;
        tokio::fs::read_to_string(&abs)
            .await
            .map_err(|source| WorkspaceError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn write(&self, path: &Path, contents: &str) -> Result<(), WorkspaceError> {
        let abs = self.absolute(path)?;
        if let Some(parent) = abs.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| WorkspaceError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&abs, contents)
            .await
            .map_err(|source| WorkspaceError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    async fn exists(&self, path: &Path) -> bool {
        match self.absolute(path) {
            Ok(abs) => tokio::fs::try_exists(&abs).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn list(&self, dir: &Path) -> Result<Vec<WorkspaceEntry>, WorkspaceError> {
        let abs = self.absolute(dir)?;
        let mut reader = tokio::fs::read_dir(&abs)
            .await
            .map_err(|source| WorkspaceError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let mut entries = Vec::new();
        while let Some(entry) =
            reader
                .next_entry()
                .await
                .map_err(|source| WorkspaceError::Io {
                    path: dir.to_path_buf(),
                    source,
                })?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(WorkspaceEntry {
                path: dir.join(entry.file_name()),
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}
