//! Fixer capability and registry
//!
//! Fixers mutate the workspace to resolve one category. The registry enforces
//! at most one fixer per category at build time. Lookup of an unregistered
//! category yields a "no fixer available" outcome, never a panic or an
//! aborted run.

use crate::error::{FixerError, RegistryError};
use crate::workspace::Workspace;
use afo_model::{Category, FixOutcome};
use afo_policy::Policy;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mutating remediator claiming exactly one category.
///
/// Implementations must be idempotent (re-running on an already-fixed
/// workspace is a successful no-op) and must not touch paths matching the
/// policy's exclusion patterns even if an issue was reported there; the
/// orchestrator filters before dispatch, but the fixer is itself defensive.
#[async_trait]
pub trait Fixer: Send + Sync {
    /// The single category this fixer claims
    fn category(&self) -> Category;

    /// Apply the fix. Return a failed [`FixOutcome`] (with touched paths)
    /// rather than `Err` once any file has been modified.
    async fn apply(
        &self,
        workspace: &dyn Workspace,
        policy: &Policy,
    ) -> Result<FixOutcome, FixerError>;
}

/// Builder assembling a [`FixerRegistry`]
#[derive(Default)]
pub struct FixerRegistryBuilder {
    fixers: Vec<Arc<dyn Fixer>>,
}

impl FixerRegistryBuilder {
    /// Register a fixer
    #[must_use]
    pub fn with(mut self, fixer: impl Fixer + 'static) -> Self {
        self.fixers.push(Arc::new(fixer));
        self
    }

    /// Register an already-shared fixer
    #[must_use]
    pub fn with_shared(mut self, fixer: Arc<dyn Fixer>) -> Self {
        self.fixers.push(fixer);
        self
    }

    /// Finalize the registry.
    ///
    /// # Errors
    /// `RegistryError::DuplicateFixer` if two fixers claim the same category.
    pub fn build(self) -> Result<FixerRegistry, RegistryError> {
        let mut fixers = BTreeMap::new();
        for fixer in self.fixers {
            let category = fixer.category();
            if fixers.insert(category, fixer).is_some() {
                return Err(RegistryError::DuplicateFixer(category));
            }
        }
        Ok(FixerRegistry { fixers })
    }
}

/// Immutable category-to-fixer mapping
#[derive(Default)]
pub struct FixerRegistry {
    fixers: BTreeMap<Category, Arc<dyn Fixer>>,
}

impl FixerRegistry {
    /// Start assembling a registry
    #[inline]
    #[must_use]
    pub fn builder() -> FixerRegistryBuilder {
        FixerRegistryBuilder::default()
    }

    /// Whether a fixer is registered for the category
    #[inline]
    #[must_use]
    pub fn has_fixer(&self, category: Category) -> bool {
        self.fixers.contains_key(&category)
    }

    /// Apply the category's fixer to the workspace.
    ///
    /// Missing fixer and fixer errors both become failed outcomes; the
    /// issue stays in the unresolved set and the run continues.
    pub async fn apply(
        &self,
        category: Category,
        workspace: &dyn Workspace,
        policy: &Policy,
    ) -> FixOutcome {
        let Some(fixer) = self.fixers.get(&category) else {
            tracing::debug!(%category, "no fixer available");
            return FixOutcome::failed(category, NO_FIXER_AVAILABLE);
        };

        match fixer.apply(workspace, policy).await {
            Ok(outcome) => {
                tracing::info!(
                    %category,
                    success = outcome.success,
                    changed = outcome.changed_paths.len(),
                    "fixer finished"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(%category, error = %e, "fixer failed");
                FixOutcome::failed(category, e.to_string())
            }
        }
    }
}

/// Failure reason recorded when a category has no registered fixer
pub const NO_FIXER_AVAILABLE: &str = "no fixer available";
