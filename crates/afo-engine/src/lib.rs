//! # afo-engine
//!
//! The orchestration core of the auto-fix pipeline:
//!
//! - **Workspace**: the filesystem boundary every capability goes through
//! - **Detectors**: concurrent, read-only, failure-isolated issue scanners
//! - **Fixers**: serialized, idempotent per-category remediations
//! - **Validator chain**: ordered safety checks, no short-circuiting
//! - **Orchestrator**: the run state machine, `Idle` through
//!   `{Published | Rejected | Failed}`
//! - **Publisher seam**: the narrow trait to external review systems
//!
//! Capabilities are registered explicitly through builders at startup; the
//! engine has no ambient registration and no persistence between runs.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod detector;
pub mod error;
pub mod fixer;
pub mod orchestrator;
pub mod publish;
pub mod validator;
pub mod workspace;

pub use detector::{Detector, DetectorRegistry, DetectorRegistryBuilder};
pub use error::{DetectorError, EngineError, FixerError, RegistryError};
pub use fixer::{Fixer, FixerRegistry, FixerRegistryBuilder, NO_FIXER_AVAILABLE};
pub use orchestrator::{DetectionReport, Orchestrator, RunFailure, RunOutcome, RunState};
pub use publish::{
    ChangePublisher, DryRunPublisher, NotificationSink, PublishError, PublishReceipt, TracingSink,
};
pub use validator::{Validator, ValidatorChain};
pub use workspace::{FsWorkspace, Workspace, WorkspaceEntry, WorkspaceError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
