//! Detected issues
//!
//! An [`Issue`] is the immutable record a detector produces for one category.
//! A fresh detector run produces a fresh issue set; nothing ever mutates a
//! prior one.

use crate::category::{Category, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A detected problem in the workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Category this issue belongs to (exactly one)
    pub category: Category,
    /// Whether the detector actually found something
    pub found: bool,
    /// Number of occurrences
    pub count: usize,
    /// Severity classification
    pub severity: Severity,
    /// Tool-specific structured details
    pub details: Map<String, Value>,
    /// Workspace-relative locations (empty for repo-wide issues)
    pub locations: Vec<PathBuf>,
}

impl Issue {
    /// Create a found issue with a single occurrence
    #[inline]
    #[must_use]
    pub fn new(category: Category, severity: Severity) -> Self {
        Self {
            category,
            found: true,
            count: 1,
            severity,
            details: Map::new(),
            locations: Vec::new(),
        }
    }

    /// Create a clean result: the detector ran and found nothing
    #[inline]
    #[must_use]
    pub fn clean(category: Category) -> Self {
        Self {
            category,
            found: false,
            count: 0,
            severity: Severity::Low,
            details: Map::new(),
            locations: Vec::new(),
        }
    }

    /// Create the degraded issue recorded when a detector fails or times out.
    ///
    /// Detector failures never abort a run; they surface as a medium-severity
    /// issue in the detector's own category so the report stays complete.
    #[must_use]
    pub fn degraded(category: Category, error: impl Into<String>) -> Self {
        Self::new(category, Severity::Medium)
            .with_detail("note", Value::String("detector failed".to_string()))
            .with_detail("error", Value::String(error.into()))
    }

    /// With occurrence count
    #[inline]
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// With a structured detail entry
    #[inline]
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    /// With a workspace-relative location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.locations.push(path.into());
        self
    }

    /// With workspace-relative locations
    #[inline]
    #[must_use]
    pub fn with_locations(mut self, paths: Vec<PathBuf>) -> Self {
        self.locations = paths;
        self
    }

    /// Whether this is a degraded (detector-failed) record
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.details
            .get("note")
            .and_then(Value::as_str)
            .is_some_and(|n| n == "detector failed")
    }
}

/// Why an issue stayed out of the auto-fix partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewReason {
    /// Category disabled in policy
    CategoryDisabled,
    /// Category is detect-only in policy
    AutoFixDisabled,
    /// Severity at or above the review threshold
    SeverityForcesReview,
    /// Issue located under an excluded path
    ExcludedPath,
    /// No fixer registered for the category
    NoFixerAvailable,
    /// Fixer ran and reported failure
    FixFailed,
    /// Fix attempted, but the issue still reproduces
    FixUnverified,
    /// Detector failed; finding is a degraded placeholder
    DetectorDegraded,
}

impl ReviewReason {
    /// Human-readable form for reports
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewReason::CategoryDisabled => "category disabled",
            ReviewReason::AutoFixDisabled => "auto-fix disabled",
            ReviewReason::SeverityForcesReview => "severity forces review",
            ReviewReason::ExcludedPath => "excluded path",
            ReviewReason::NoFixerAvailable => "no fixer available",
            ReviewReason::FixFailed => "fix failed",
            ReviewReason::FixUnverified => "fix attempted, unresolved",
            ReviewReason::DetectorDegraded => "detector failed",
        }
    }
}

/// An issue retained for human review, with the reason it was retained
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedIssue {
    /// The retained issue
    pub issue: Issue,
    /// Why it was not auto-fixed (or why the fix did not stick)
    pub reason: ReviewReason,
}

impl UnresolvedIssue {
    /// Create new unresolved entry
    #[inline]
    #[must_use]
    pub fn new(issue: Issue, reason: ReviewReason) -> Self {
        Self { issue, reason }
    }
}
