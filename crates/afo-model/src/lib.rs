//! AFO Model - shared data types for the auto-fix pipeline
//!
//! Defines the vocabulary every other crate speaks:
//! - Categories and severities
//! - Issues produced by detectors
//! - Fix outcomes produced by fixers
//! - Change sets and validation reports
//! - Run summaries for notification sinks
//!
//! All types are immutable once produced: a new detector run produces a fresh
//! issue set, never mutates a prior one.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod category;
pub mod changeset;
pub mod fix;
pub mod issue;
pub mod summary;

// Re-exports for convenience
pub use category::{Category, Severity, UnknownCategory, UnknownSeverity};
pub use changeset::{ChangeSet, ValidationReport, ValidatorOutcome};
pub use fix::FixOutcome;
pub use issue::{Issue, ReviewReason, UnresolvedIssue};
pub use summary::RunSummary;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
