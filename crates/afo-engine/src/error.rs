//! Engine error taxonomy
//!
//! Only failures that prevent producing a clean, validated change set are
//! errors here. Detector failures degrade to issues and fixer failures become
//! failed outcomes; neither ever aborts a run.

use crate::workspace::WorkspaceError;
use afo_model::Category;
use afo_policy::PolicyError;

/// Errors surfaced by the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Malformed or missing policy; fatal, the run never starts
    #[error("configuration error: {0}")]
    Config(#[from] PolicyError),

    /// Registry assembly violated an invariant
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Workspace infrastructure failed outside any capability
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Run cancelled between phases
    #[error("run cancelled")]
    Cancelled,
}

impl EngineError {
    /// Whether this is a configuration error (CLI exit code 2)
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Registry(_))
    }
}

/// Errors assembling a registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A second fixer claimed an already-claimed category
    #[error("duplicate fixer for category {0}")]
    DuplicateFixer(Category),
}

/// Errors a detector may return from a scan.
///
/// These never propagate beyond the registry: a failing detector yields a
/// degraded issue in its own category.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// Workspace access failed
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The underlying analysis tool failed
    #[error("{0}")]
    Tool(String),
}

/// Errors a fixer may return.
///
/// A fixer that already modified files must instead return a failed
/// [`afo_model::FixOutcome`] carrying the touched paths, so the audit trail
/// stays accurate; an `Err` is for failures before any mutation.
#[derive(Debug, thiserror::Error)]
pub enum FixerError {
    /// Workspace access failed
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    /// The underlying remediation tool failed
    #[error("{0}")]
    Tool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_flagged() {
        let err = EngineError::from(RegistryError::DuplicateFixer(Category::Docker));
        assert!(err.is_config());
        assert!(!EngineError::Cancelled.is_config());
    }

    #[test]
    fn duplicate_fixer_display() {
        let err = RegistryError::DuplicateFixer(Category::Formatting);
        assert_eq!(err.to_string(), "duplicate fixer for category formatting");
    }
}
