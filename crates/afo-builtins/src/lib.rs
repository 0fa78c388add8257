//! # afo-builtins
//!
//! Stock capabilities for container and dependency hygiene: Dockerfile
//! best-practice checks, compose healthchecks and credential scanning,
//! dependency pinning, and the syntax validators that gate publication.
//! Everything here goes through the engine's `Workspace` trait; no external
//! tools are spawned.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod compose;
pub mod dependency;
pub mod docker;
pub mod validators;

pub use compose::{ComposeDetector, ComposeHealthcheckFixer};
pub use dependency::{DependencyPinDetector, RequirementsPinFixer};
pub use docker::{DockerfileDetector, DockerignoreFixer, DEFAULT_DOCKERIGNORE};
pub use validators::{ComposeSyntaxValidator, JsonSyntaxValidator};

use afo_engine::{DetectorRegistry, FixerRegistry, RegistryError, ValidatorChain};

/// Registry with every stock detector
#[must_use]
pub fn stock_detectors() -> DetectorRegistry {
    DetectorRegistry::builder()
        .with(DockerfileDetector)
        .with(ComposeDetector)
        .with(DependencyPinDetector)
        .build()
}

/// Registry with every stock fixer.
///
/// # Errors
/// `RegistryError::DuplicateFixer` cannot occur for the stock set; the
/// result type exists so callers can extend the builder first.
pub fn stock_fixers() -> Result<FixerRegistry, RegistryError> {
    FixerRegistry::builder()
        .with(DockerignoreFixer)
        .with(ComposeHealthcheckFixer)
        .with(RequirementsPinFixer)
        .build()
}

/// Chain with every stock validator, in publication-gate order
#[must_use]
pub fn stock_validators() -> ValidatorChain {
    ValidatorChain::new()
        .with(ComposeSyntaxValidator)
        .with(JsonSyntaxValidator)
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use afo_model::Category;

    #[test]
    fn stock_sets_assemble() {
        assert_eq!(stock_detectors().len(), 3);
        let fixers = stock_fixers().unwrap();
        assert!(fixers.has_fixer(Category::Docker));
        assert!(fixers.has_fixer(Category::Config));
        assert!(fixers.has_fixer(Category::Dependency));
        assert_eq!(stock_validators().len(), 2);
    }
}
