//! Policy configuration source
//!
//! The serde shape of the TOML policy file. Recognized options:
//! per-category `enabled` / `auto_fix`, ordered `exclude_paths` glob
//! patterns, `severity_review_threshold`, and detector timeout tuning.
//!
//! ```toml
//! severity_review_threshold = "high"
//! exclude_paths = ["vendor/**", "third_party/**"]
//! detector_timeout_secs = 30
//!
//! [categories.formatting]
//! auto_fix = true
//!
//! [categories.security]
//! enabled = true
//! auto_fix = false
//! ```

use afo_model::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category rule: detect only vs. detect-and-fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryRule {
    /// Whether the category's detectors run at all
    pub enabled: bool,
    /// Whether issues in this category may be auto-fixed
    pub auto_fix: bool,
}

impl Default for CategoryRule {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_fix: false,
        }
    }
}

impl CategoryRule {
    /// Detect-and-fix rule
    #[inline]
    #[must_use]
    pub fn auto_fixable() -> Self {
        Self {
            enabled: true,
            auto_fix: true,
        }
    }

    /// Rule for a disabled category
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            auto_fix: false,
        }
    }
}

/// Raw policy configuration, as loaded from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Per-category rules, keyed by category name; unlisted categories get
    /// the defaults (enabled, not auto-fixable)
    pub categories: BTreeMap<String, CategoryRule>,
    /// Ordered glob patterns for paths the pipeline must never touch
    pub exclude_paths: Vec<String>,
    /// Issues at or above this severity always require review
    pub severity_review_threshold: Option<Severity>,
    /// Per-detector timeout; a hang becomes a degraded issue
    pub detector_timeout_secs: Option<u64>,
}

impl PolicyConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a category rule
    #[inline]
    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>, rule: CategoryRule) -> Self {
        self.categories.insert(name.into(), rule);
        self
    }

    /// With an exclusion pattern
    #[inline]
    #[must_use]
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_paths.push(pattern.into());
        self
    }

    /// With a severity review threshold
    #[inline]
    #[must_use]
    pub fn with_review_threshold(mut self, severity: Severity) -> Self {
        self.severity_review_threshold = Some(severity);
        self
    }
}
