//! Fix outcomes
//!
//! A [`FixOutcome`] is what a fixer reports after running for one category.
//! A fixer either fully resolves its category or reports failure; partial
//! application counts as failure, but touched paths are always recorded so
//! diffing and auditing stay accurate.

use crate::category::Category;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of applying one fixer to the workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixOutcome {
    /// Category the fixer addressed
    pub category: Category,
    /// Whether the category was fully resolved
    pub success: bool,
    /// Workspace-relative paths the fixer modified
    pub changed_paths: Vec<PathBuf>,
    /// Failure reason, for audit (None on success)
    pub reason: Option<String>,
}

impl FixOutcome {
    /// Successful fix that changed the given paths
    #[inline]
    #[must_use]
    pub fn applied(category: Category, changed_paths: Vec<PathBuf>) -> Self {
        Self {
            category,
            success: true,
            changed_paths,
            reason: None,
        }
    }

    /// Successful no-op: the workspace was already in the fixed state
    #[inline]
    #[must_use]
    pub fn noop(category: Category) -> Self {
        Self::applied(category, Vec::new())
    }

    /// Failed fix. Paths touched before the failure must still be reported.
    #[inline]
    #[must_use]
    pub fn failed(category: Category, reason: impl Into<String>) -> Self {
        Self {
            category,
            success: false,
            changed_paths: Vec::new(),
            reason: Some(reason.into()),
        }
    }

    /// With touched paths (for failed outcomes that modified files)
    #[inline]
    #[must_use]
    pub fn with_changed_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.changed_paths = paths;
        self
    }

    /// Whether this outcome modified any file
    #[inline]
    #[must_use]
    pub fn changed_anything(&self) -> bool {
        !self.changed_paths.is_empty()
    }
}
