//! AFO Policy - run-scoped remediation policy
//!
//! Decides which categories are detected, which may be auto-fixed, which
//! paths are off limits, and which severities always require human review:
//! - [`PolicyConfig`]: the TOML configuration source
//! - [`Policy`]: the compiled, immutable per-run snapshot
//!
//! # Example
//!
//! ```rust
//! use afo_policy::{CategoryRule, Policy, PolicyConfig};
//! use afo_model::Category;
//!
//! let config = PolicyConfig::new()
//!     .with_category("formatting", CategoryRule::auto_fixable())
//!     .with_exclude("vendor/**");
//! let policy = Policy::from_config(&config).unwrap();
//!
//! assert!(policy.is_auto_fixable(Category::Formatting));
//! assert!(!policy.is_auto_fixable(Category::Security));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod policy;

// Re-exports for convenience
pub use config::{CategoryRule, PolicyConfig};
pub use error::PolicyError;
pub use policy::Policy;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
