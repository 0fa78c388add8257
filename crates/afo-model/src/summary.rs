//! Run summaries for the notification sink
//!
//! A [`RunSummary`] carries category and severity counts plus the terminal
//! outcome label. Delivery is external; the core only builds the value.

use crate::category::{Category, Severity};
use crate::fix::FixOutcome;
use crate::issue::Issue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Structured summary of one orchestrator run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Run identifier
    pub run_id: Uuid,
    /// Terminal outcome label ("published", "rejected", "failed")
    pub outcome: String,
    /// Issues found, per category
    pub issues_by_category: BTreeMap<Category, usize>,
    /// Issues found, per severity
    pub issues_by_severity: BTreeMap<Severity, usize>,
    /// Number of successful fix outcomes
    pub fixes_applied: usize,
    /// Number of issues retained for review
    pub unresolved: usize,
}

impl RunSummary {
    /// Build a summary from the run's raw material
    #[must_use]
    pub fn new(
        run_id: Uuid,
        outcome: impl Into<String>,
        issues: &[Issue],
        outcomes: &[FixOutcome],
        unresolved: usize,
    ) -> Self {
        let mut by_category = BTreeMap::new();
        let mut by_severity = BTreeMap::new();
        for issue in issues.iter().filter(|i| i.found) {
            *by_category.entry(issue.category).or_insert(0) += issue.count.max(1);
            *by_severity.entry(issue.severity).or_insert(0) += issue.count.max(1);
        }
        Self {
            run_id,
            outcome: outcome.into(),
            issues_by_category: by_category,
            issues_by_severity: by_severity,
            fixes_applied: outcomes.iter().filter(|o| o.success).count(),
            unresolved,
        }
    }

    /// Total issue occurrences across all categories
    #[inline]
    #[must_use]
    pub fn total_issues(&self) -> usize {
        self.issues_by_category.values().sum()
    }
}
