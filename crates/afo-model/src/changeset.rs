//! Change sets and validation reports
//!
//! A [`ChangeSet`] is the final artifact of a successful run: the applied fix
//! outcomes, the issues retained for review, and the validation report that
//! gates publication. Created fresh per run and handed to the external change
//! publisher; the core never persists it.

use crate::category::Severity;
use crate::fix::FixOutcome;
use crate::issue::{Issue, UnresolvedIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Result of one validator in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorOutcome {
    /// Validator name
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Diagnostic text for the reviewer
    pub diagnostic: String,
}

impl ValidatorOutcome {
    /// Passing outcome
    #[inline]
    #[must_use]
    pub fn pass(name: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            diagnostic: diagnostic.into(),
        }
    }

    /// Failing outcome
    #[inline]
    #[must_use]
    pub fn fail(name: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Aggregated results of the whole validator chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Per-validator outcomes, in chain order
    pub outcomes: Vec<ValidatorOutcome>,
}

impl ValidationReport {
    /// Report for an empty chain (vacuously passing)
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether every validator passed
    #[inline]
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// Diagnostics of the failing validators
    #[must_use]
    pub fn failures(&self) -> Vec<&ValidatorOutcome> {
        self.outcomes.iter().filter(|o| !o.passed).collect()
    }

    /// One-line diagnostic summary for logs and error text
    #[must_use]
    pub fn summary(&self) -> String {
        if self.passed() {
            format!("{} validator(s) passed", self.outcomes.len())
        } else {
            self.failures()
                .iter()
                .map(|o| format!("{}: {}", o.name, o.diagnostic))
                .collect::<Vec<_>>()
                .join("; ")
        }
    }
}

/// The packaged output of a run, handed to the change publisher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeSet {
    /// Unique change-set identifier
    pub id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Human-readable summary
    pub summary: String,
    /// Fix outcomes applied this run
    pub outcomes: Vec<FixOutcome>,
    /// Issues retained for review (review-required or fix-failed)
    pub unresolved: Vec<UnresolvedIssue>,
    /// Validation report gating publication
    pub validation: ValidationReport,
}

impl ChangeSet {
    /// Create new change set
    #[must_use]
    pub fn new(
        summary: impl Into<String>,
        outcomes: Vec<FixOutcome>,
        unresolved: Vec<UnresolvedIssue>,
        validation: ValidationReport,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            summary: summary.into(),
            outcomes,
            unresolved,
            validation,
        }
    }

    /// Union of paths changed by successful outcomes, deduplicated and sorted
    #[must_use]
    pub fn changed_paths(&self) -> Vec<PathBuf> {
        let set: BTreeSet<PathBuf> = self
            .outcomes
            .iter()
            .filter(|o| o.success)
            .flat_map(|o| o.changed_paths.iter().cloned())
            .collect();
        set.into_iter().collect()
    }

    /// Whether any successful outcome modified the workspace
    #[inline]
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.outcomes.iter().any(|o| o.success && o.changed_anything())
    }

    /// Readiness gate checked before publication.
    ///
    /// A change set is ready only if validation succeeded, no excluded path
    /// was touched, and every critical-severity issue whose category got an
    /// applied fix is still retained in `unresolved` for visibility.
    pub fn is_ready<F>(&self, applied_issues: &[Issue], is_excluded: F) -> bool
    where
        F: Fn(&Path) -> bool,
    {
        if !self.validation.passed() {
            return false;
        }
        if self
            .outcomes
            .iter()
            .flat_map(|o| o.changed_paths.iter())
            .any(|p| is_excluded(p))
        {
            return false;
        }
        applied_issues
            .iter()
            .filter(|i| i.severity == Severity::Critical)
            .all(|i| self.unresolved.iter().any(|u| u.issue.category == i.category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::issue::ReviewReason;

    fn report_pass() -> ValidationReport {
        ValidationReport {
            outcomes: vec![ValidatorOutcome::pass("yaml", "ok")],
        }
    }

    #[test]
    fn empty_report_passes() {
        assert!(ValidationReport::empty().passed());
    }

    #[test]
    fn report_failure_summary() {
        let report = ValidationReport {
            outcomes: vec![
                ValidatorOutcome::pass("yaml", "ok"),
                ValidatorOutcome::fail("build", "compile error in main"),
            ],
        };
        assert!(!report.passed());
        assert_eq!(report.failures().len(), 1);
        assert!(report.summary().contains("compile error"));
    }

    #[test]
    fn changed_paths_union_deduplicates() {
        let cs = ChangeSet::new(
            "test",
            vec![
                FixOutcome::applied(Category::Docker, vec!["a".into(), "b".into()]),
                FixOutcome::applied(Category::Config, vec!["b".into()]),
                FixOutcome::failed(Category::Lint, "boom")
                    .with_changed_paths(vec!["c".into()]),
            ],
            Vec::new(),
            report_pass(),
        );
        // Failed outcomes are excluded from the published diff
        assert_eq!(
            cs.changed_paths(),
            vec![PathBuf::from("a"), PathBuf::from("b")]
        );
        assert!(cs.has_changes());
    }

    #[test]
    fn ready_requires_validation() {
        let cs = ChangeSet::new(
            "test",
            vec![FixOutcome::noop(Category::Formatting)],
            Vec::new(),
            ValidationReport {
                outcomes: vec![ValidatorOutcome::fail("tests", "2 failed")],
            },
        );
        assert!(!cs.is_ready(&[], |_| false));
    }

    #[test]
    fn ready_rejects_excluded_paths() {
        let cs = ChangeSet::new(
            "test",
            vec![FixOutcome::applied(Category::Docker, vec!["vendor/x".into()])],
            Vec::new(),
            report_pass(),
        );
        assert!(!cs.is_ready(&[], |p| p.starts_with("vendor")));
        assert!(cs.is_ready(&[], |_| false));
    }

    #[test]
    fn ready_requires_critical_visibility() {
        let critical = Issue::new(Category::Security, Severity::Critical);
        let cs = ChangeSet::new(
            "test",
            vec![FixOutcome::applied(Category::Security, vec!["auth.py".into()])],
            Vec::new(),
            report_pass(),
        );
        // Critical issue auto-applied but not retained for review
        assert!(!cs.is_ready(std::slice::from_ref(&critical), |_| false));

        let visible = ChangeSet::new(
            "test",
            cs.outcomes.clone(),
            vec![UnresolvedIssue::new(
                critical.clone(),
                ReviewReason::SeverityForcesReview,
            )],
            report_pass(),
        );
        assert!(visible.is_ready(std::slice::from_ref(&critical), |_| false));
    }
}
