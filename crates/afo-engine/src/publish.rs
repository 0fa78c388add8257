//! External collaborator seams
//!
//! The change publisher turns a change set into a human-reviewable artifact;
//! the notification sink receives run summaries for out-of-band alerting.
//! The core's only contract with either is the narrow trait here.

use afo_model::{ChangeSet, RunSummary};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Acknowledgement from the change publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Publisher-side identifier of the reviewable artifact
    /// (e.g. a review-request URL or number)
    pub identifier: String,
}

impl PublishReceipt {
    /// Create new receipt
    #[inline]
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

/// Errors handing a change set to the publisher.
///
/// A publish error fails the run with the underlying reason preserved; fixes
/// are never retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Publisher rejected the change set
    #[error("publisher rejected change set: {0}")]
    Rejected(String),

    /// Publisher could not be reached
    #[error("publisher unavailable: {0}")]
    Unavailable(String),
}

/// External system that turns a change set into a reviewable request
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Deliver the change set; receive an identifier or an error
    async fn publish(&self, changeset: &ChangeSet) -> Result<PublishReceipt, PublishError>;
}

/// Publisher that accepts everything without side effects.
///
/// Used for dry runs and tests; the receipt carries the change-set id.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunPublisher;

#[async_trait]
impl ChangePublisher for DryRunPublisher {
    async fn publish(&self, changeset: &ChangeSet) -> Result<PublishReceipt, PublishError> {
        tracing::info!(
            changeset = %changeset.id,
            paths = changeset.changed_paths().len(),
            "dry-run publish"
        );
        Ok(PublishReceipt::new(format!("dry-run/{}", changeset.id)))
    }
}

/// Optional receiver of run summaries
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a structured run summary
    async fn notify(&self, summary: &RunSummary);
}

/// Sink that logs summaries through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, summary: &RunSummary) {
        tracing::info!(
            run_id = %summary.run_id,
            outcome = %summary.outcome,
            issues = summary.total_issues(),
            fixes_applied = summary.fixes_applied,
            unresolved = summary.unresolved,
            "run summary"
        );
    }
}
