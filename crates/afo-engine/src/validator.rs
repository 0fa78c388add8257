//! Validator chain
//!
//! Post-fix checks gating whether a change set may be published. The chain
//! runs after all fixes and before finalization, sequentially in
//! registration order, and never short-circuits: every validator executes so
//! the reviewer gets a complete diagnostic report.

use crate::workspace::Workspace;
use afo_model::{ValidationReport, ValidatorOutcome};
use async_trait::async_trait;
use std::sync::Arc;

/// One post-fix check
#[async_trait]
pub trait Validator: Send + Sync {
    /// Name used in the validation report
    fn name(&self) -> &str;

    /// Run the check. Internal errors are failing outcomes, not panics.
    async fn check(&self, workspace: &dyn Workspace) -> ValidatorOutcome;
}

/// Ordered list of validators
#[derive(Default)]
pub struct ValidatorChain {
    validators: Vec<Arc<dyn Validator>>,
}

impl ValidatorChain {
    /// Create an empty chain (vacuously passing)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator
    #[must_use]
    pub fn with(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Append an already-shared validator
    #[must_use]
    pub fn with_shared(mut self, validator: Arc<dyn Validator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Number of validators in the chain
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Whether the chain is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every validator in order, collecting all outcomes.
    ///
    /// Later validators may depend on the fully-fixed tree, so execution is
    /// strictly sequential.
    pub async fn run(&self, workspace: &dyn Workspace) -> ValidationReport {
        let mut outcomes = Vec::with_capacity(self.validators.len());
        for validator in &self.validators {
            let outcome = validator.check(workspace).await;
            if outcome.passed {
                tracing::debug!(validator = %outcome.name, "validator passed");
            } else {
                tracing::warn!(validator = %outcome.name, diagnostic = %outcome.diagnostic, "validator failed");
            }
            outcomes.push(outcome);
        }
        ValidationReport { outcomes }
    }
}
