//! Run orchestration
//!
//! Sequences detection, partitioning, fix application, revalidation,
//! validation, and change-set packaging:
//!
//! `Idle → Detecting → Partitioning → Fixing → Revalidating → Finalizing →
//! {Published | Rejected | Failed}`
//!
//! Detection is concurrent over a read-only workspace; fixing is serialized
//! in category enumeration order; validation runs sequentially on the fully
//! fixed tree. The run is cancellable between phases only; a cancel
//! requested mid-fix is honored after the in-flight fixer returns, so the
//! workspace never ends up half-applied. Nothing is retried automatically.

use crate::detector::DetectorRegistry;
use crate::error::EngineError;
use crate::fixer::FixerRegistry;
use crate::publish::{ChangePublisher, NotificationSink, PublishReceipt};
use crate::validator::ValidatorChain;
use crate::workspace::Workspace;
use afo_model::{
    Category, ChangeSet, FixOutcome, Issue, ReviewReason, RunSummary, UnresolvedIssue,
    ValidationReport,
};
use afo_policy::Policy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Phase of an orchestrator run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Detecting,
    Partitioning,
    Fixing,
    Revalidating,
    Finalizing,
    Published,
    Rejected,
    Failed,
}

impl RunState {
    /// Whether this state admits no further transitions
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Rejected | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Detecting => "detecting",
            RunState::Partitioning => "partitioning",
            RunState::Fixing => "fixing",
            RunState::Revalidating => "revalidating",
            RunState::Finalizing => "finalizing",
            RunState::Published => "published",
            RunState::Rejected => "rejected",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a run terminated in `Failed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum RunFailure {
    /// One or more validators failed; full report attached
    Validation {
        /// Complete diagnostic report (all validators ran)
        report: ValidationReport,
    },
    /// The publisher rejected the change set
    Publish {
        /// Underlying reason, preserved verbatim
        reason: String,
    },
    /// The change set violated a readiness invariant
    NotReady {
        /// Which invariant failed
        reason: String,
    },
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunFailure::Validation { report } => {
                write!(f, "validation failed: {}", report.summary())
            }
            RunFailure::Publish { reason } => write!(f, "publish failed: {reason}"),
            RunFailure::NotReady { reason } => write!(f, "change set not ready: {reason}"),
        }
    }
}

/// Terminal result of one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "outcome")]
pub enum RunOutcome {
    /// Change set validated and handed to the publisher
    Published {
        /// Publisher acknowledgement
        receipt: PublishReceipt,
        /// The published change set
        changeset: ChangeSet,
    },
    /// Nothing to propose (no auto-fixable issues produced a diff)
    Rejected {
        /// Rejection reason
        reason: String,
        /// Issues still requiring review
        unresolved: Vec<UnresolvedIssue>,
    },
    /// Run failed; nothing reached the publisher
    Failed {
        /// Failure detail with full diagnostics
        failure: RunFailure,
    },
}

impl RunOutcome {
    /// Terminal state this outcome corresponds to
    #[inline]
    #[must_use]
    pub fn state(&self) -> RunState {
        match self {
            RunOutcome::Published { .. } => RunState::Published,
            RunOutcome::Rejected { .. } => RunState::Rejected,
            RunOutcome::Failed { .. } => RunState::Failed,
        }
    }

    /// Label used in run summaries
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Published { .. } => "published",
            RunOutcome::Rejected { .. } => "rejected",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// Result of a detect-only pass: the raw partition, nothing applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Issues that would be auto-fixed, grouped by category
    pub auto_fixable: BTreeMap<Category, Vec<Issue>>,
    /// Issues requiring review, with reasons
    pub review: Vec<UnresolvedIssue>,
}

impl DetectionReport {
    /// Total found issues across both partitions
    #[must_use]
    pub fn total(&self) -> usize {
        self.auto_fixable.values().map(Vec::len).sum::<usize>() + self.review.len()
    }
}

/// Issue partition produced by the `Partitioning` phase
struct Partition {
    auto: BTreeMap<Category, Vec<Issue>>,
    review: Vec<UnresolvedIssue>,
}

/// Partition found issues into auto-fixable vs. review-required.
///
/// Auto-fixable requires: category enabled and auto-fixable, severity below
/// the review threshold, no excluded location, and a genuine (non-degraded)
/// finding.
fn partition(issues: Vec<Issue>, policy: &Policy) -> Partition {
    let mut auto: BTreeMap<Category, Vec<Issue>> = BTreeMap::new();
    let mut review = Vec::new();

    for issue in issues {
        let category = issue.category;
        let reason = if !policy.is_enabled(category) {
            Some(ReviewReason::CategoryDisabled)
        } else if issue.is_degraded() {
            Some(ReviewReason::DetectorDegraded)
        } else if !policy.is_auto_fixable(category) {
            Some(ReviewReason::AutoFixDisabled)
        } else if policy.severity_forces_review(&issue) {
            Some(ReviewReason::SeverityForcesReview)
        } else if issue.locations.iter().any(|p| policy.is_excluded(p)) {
            Some(ReviewReason::ExcludedPath)
        } else {
            None
        };

        match reason {
            Some(reason) => review.push(UnresolvedIssue::new(issue, reason)),
            None => auto.entry(category).or_default().push(issue),
        }
    }

    Partition { auto, review }
}

/// The orchestration engine
///
/// Owns the capability registries, the policy snapshot, and the publisher
/// seam. Every run starts fresh from `Idle`; terminal states are final.
pub struct Orchestrator {
    policy: Arc<Policy>,
    detectors: DetectorRegistry,
    fixers: FixerRegistry,
    validators: ValidatorChain,
    publisher: Arc<dyn ChangePublisher>,
    sink: Option<Arc<dyn NotificationSink>>,
    cancel: CancellationToken,
}

impl Orchestrator {
    /// Create a new orchestrator
    #[must_use]
    pub fn new(
        policy: Arc<Policy>,
        detectors: DetectorRegistry,
        fixers: FixerRegistry,
        validators: ValidatorChain,
        publisher: Arc<dyn ChangePublisher>,
    ) -> Self {
        Self {
            policy,
            detectors,
            fixers,
            validators,
            publisher,
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// With a notification sink for run summaries
    #[must_use]
    pub fn with_notification_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Token callers may use to cancel the run between phases
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute one full orchestration pass.
    ///
    /// # Errors
    /// Only `EngineError::Cancelled` (cooperative cancel between phases) and
    /// infrastructure failures. Validation and publish failures are terminal
    /// outcomes (`RunOutcome::Failed`), not errors.
    pub async fn run(&self, workspace: Arc<dyn Workspace>) -> Result<RunOutcome, EngineError> {
        let run_id = Uuid::new_v4();
        tracing::info!(%run_id, root = %workspace.root().display(), "run starting");

        // Detecting
        let found = self.detect(&workspace, run_id).await?;
        tracing::info!(%run_id, issues = found.len(), "detection complete");

        // Partitioning
        self.checkpoint(RunState::Partitioning, run_id)?;
        let Partition { auto, mut review } = partition(found.clone(), &self.policy);
        tracing::info!(
            %run_id,
            auto_categories = auto.len(),
            review = review.len(),
            "partitioned"
        );

        // Fixing: one fixer per distinct category, serialized, stable order
        self.checkpoint(RunState::Fixing, run_id)?;
        let mut outcomes: Vec<FixOutcome> = Vec::new();
        let mut applied_issues: Vec<Issue> = Vec::new();
        let mut fixed_categories: BTreeSet<Category> = BTreeSet::new();

        for category in Category::ALL {
            let Some(issues) = auto.get(&category) else {
                continue;
            };
            // Honor cancellation only between fixers, never mid-mutation
            if self.cancel.is_cancelled() {
                tracing::warn!(%run_id, "cancelled during fixing; stopping after in-flight fixer");
                return Err(EngineError::Cancelled);
            }

            let outcome = self
                .fixers
                .apply(category, workspace.as_ref(), &self.policy)
                .await;
            if outcome.success {
                fixed_categories.insert(category);
                applied_issues.extend(issues.iter().cloned());
            } else {
                let reason = if outcome.reason.as_deref() == Some(crate::fixer::NO_FIXER_AVAILABLE)
                {
                    ReviewReason::NoFixerAvailable
                } else {
                    ReviewReason::FixFailed
                };
                review.extend(
                    issues
                        .iter()
                        .cloned()
                        .map(|issue| UnresolvedIssue::new(issue, reason)),
                );
            }
            outcomes.push(outcome);
        }

        // Revalidating: confirm fixed categories no longer reproduce
        self.checkpoint(RunState::Revalidating, run_id)?;
        if !fixed_categories.is_empty() {
            let recheck = tokio::select! {
                _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
                issues = self.detectors.run_categories(
                    Arc::clone(&workspace),
                    &self.policy,
                    &fixed_categories,
                ) => issues,
            };
            for issue in recheck.into_iter().filter(|i| i.found) {
                // A failed re-scan cannot confirm anything either way; keep it
                // distinct from a fix that demonstrably did not stick.
                let reason = if issue.is_degraded() {
                    tracing::warn!(%run_id, category = %issue.category, "re-scan failed after fix");
                    ReviewReason::DetectorDegraded
                } else {
                    tracing::warn!(%run_id, category = %issue.category, "issue persists after fix");
                    ReviewReason::FixUnverified
                };
                review.push(UnresolvedIssue::new(issue, reason));
            }
        }

        // Finalizing
        self.checkpoint(RunState::Finalizing, run_id)?;
        let report = self.validators.run(workspace.as_ref()).await;
        if !report.passed() {
            tracing::error!(%run_id, diagnostics = %report.summary(), "validation failed; discarding change");
            let outcome = RunOutcome::Failed {
                failure: RunFailure::Validation { report },
            };
            self.notify(run_id, &outcome, &found, &outcomes, review.len()).await;
            return Ok(outcome);
        }

        let changeset = ChangeSet::new(
            describe(&fixed_categories, &review),
            outcomes.clone(),
            review.clone(),
            report,
        );

        if !changeset.has_changes() {
            let outcome = RunOutcome::Rejected {
                reason: "no auto-fixable issues found".to_string(),
                unresolved: review,
            };
            tracing::info!(%run_id, "nothing to propose");
            self.notify(run_id, &outcome, &found, &outcomes, outcome_unresolved(&outcome))
                .await;
            return Ok(outcome);
        }

        if !changeset.is_ready(&applied_issues, |p| self.policy.is_excluded(p)) {
            let outcome = RunOutcome::Failed {
                failure: RunFailure::NotReady {
                    reason: "excluded path touched or critical fix not retained for review"
                        .to_string(),
                },
            };
            self.notify(run_id, &outcome, &found, &outcomes, review.len()).await;
            return Ok(outcome);
        }

        let outcome = match self.publisher.publish(&changeset).await {
            Ok(receipt) => {
                tracing::info!(%run_id, identifier = %receipt.identifier, "change set published");
                RunOutcome::Published { receipt, changeset }
            }
            Err(e) => {
                tracing::error!(%run_id, error = %e, "publish failed");
                RunOutcome::Failed {
                    failure: RunFailure::Publish {
                        reason: e.to_string(),
                    },
                }
            }
        };
        self.notify(run_id, &outcome, &found, &outcomes, review.len()).await;
        Ok(outcome)
    }

    /// Detection and partitioning only; skips fixing and finalizing.
    pub async fn detect_only(
        &self,
        workspace: Arc<dyn Workspace>,
    ) -> Result<DetectionReport, EngineError> {
        let run_id = Uuid::new_v4();
        let found = self.detect(&workspace, run_id).await?;
        self.checkpoint(RunState::Partitioning, run_id)?;
        let Partition { auto, review } = partition(found, &self.policy);
        Ok(DetectionReport {
            auto_fixable: auto,
            review,
        })
    }

    async fn detect(
        &self,
        workspace: &Arc<dyn Workspace>,
        run_id: Uuid,
    ) -> Result<Vec<Issue>, EngineError> {
        self.checkpoint(RunState::Detecting, run_id)?;
        // Cancellation during detection discards partial results
        let issues = tokio::select! {
            _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
            issues = self.detectors.run_all(Arc::clone(workspace), &self.policy) => issues,
        };
        Ok(issues.into_iter().filter(|i| i.found).collect())
    }

    fn checkpoint(&self, state: RunState, run_id: Uuid) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            tracing::warn!(%run_id, %state, "cancelled before phase");
            return Err(EngineError::Cancelled);
        }
        tracing::debug!(%run_id, %state, "entering phase");
        Ok(())
    }

    async fn notify(
        &self,
        run_id: Uuid,
        outcome: &RunOutcome,
        issues: &[Issue],
        outcomes: &[FixOutcome],
        unresolved: usize,
    ) {
        if let Some(sink) = &self.sink {
            let summary = RunSummary::new(run_id, outcome.label(), issues, outcomes, unresolved);
            sink.notify(&summary).await;
        }
    }
}

fn outcome_unresolved(outcome: &RunOutcome) -> usize {
    match outcome {
        RunOutcome::Rejected { unresolved, .. } => unresolved.len(),
        RunOutcome::Published { changeset, .. } => changeset.unresolved.len(),
        RunOutcome::Failed { .. } => 0,
    }
}

fn describe(fixed: &BTreeSet<Category>, review: &[UnresolvedIssue]) -> String {
    let fixed_names: Vec<&str> = fixed.iter().map(Category::as_str).collect();
    format!(
        "auto-fix: {} categor{} fixed ({}), {} issue(s) retained for review",
        fixed.len(),
        if fixed.len() == 1 { "y" } else { "ies" },
        fixed_names.join(", "),
        review.len()
    )
}
