//! Compiled policy snapshot
//!
//! A [`Policy`] is built once per run from a [`PolicyConfig`] and treated as
//! immutable for the run's duration: concurrent detector and fixer executions
//! observe a single consistent snapshot (share it via `Arc`). There is no
//! ambient or global lookup; every phase receives the snapshot explicitly.

use crate::config::{CategoryRule, PolicyConfig};
use crate::error::PolicyError;
use afo_model::{Category, Issue, Severity};
use glob::Pattern;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_DETECTOR_TIMEOUT: Duration = Duration::from_secs(30);

/// Immutable, run-scoped policy snapshot
#[derive(Debug, Clone)]
pub struct Policy {
    rules: BTreeMap<Category, CategoryRule>,
    exclude: Vec<Pattern>,
    review_threshold: Severity,
    detector_timeout: Duration,
}

impl Policy {
    /// Compile a configuration into a snapshot.
    ///
    /// # Errors
    /// - `PolicyError::UnknownCategory` for unrecognized category keys
    /// - `PolicyError::InvalidPattern` for uncompilable exclusion globs
    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicyError> {
        let mut rules = BTreeMap::new();
        for (name, rule) in &config.categories {
            rules.insert(name.parse::<Category>()?, *rule);
        }

        let mut exclude = Vec::with_capacity(config.exclude_paths.len());
        for pattern in &config.exclude_paths {
            exclude.push(Pattern::new(pattern).map_err(|source| {
                PolicyError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?);
        }

        Ok(Self {
            rules,
            exclude,
            review_threshold: config
                .severity_review_threshold
                .unwrap_or(Severity::Critical),
            detector_timeout: config
                .detector_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_DETECTOR_TIMEOUT),
        })
    }

    /// Load and compile a TOML policy file.
    ///
    /// # Errors
    /// Any read, parse, or compile failure; all are fatal configuration
    /// errors and the run never starts.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PolicyConfig = toml::from_str(&text)?;
        Self::from_config(&config)
    }

    fn rule(&self, category: Category) -> CategoryRule {
        self.rules.get(&category).copied().unwrap_or_default()
    }

    /// Whether the category's detectors run at all
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, category: Category) -> bool {
        self.rule(category).enabled
    }

    /// Whether issues in this category may be auto-fixed
    #[inline]
    #[must_use]
    pub fn is_auto_fixable(&self, category: Category) -> bool {
        let rule = self.rule(category);
        rule.enabled && rule.auto_fix
    }

    /// Whether a workspace-relative path matches an exclusion pattern
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude.iter().any(|p| p.matches_path(path))
    }

    /// Whether the issue's severity forces review regardless of
    /// auto-fixability
    #[inline]
    #[must_use]
    pub fn severity_forces_review(&self, issue: &Issue) -> bool {
        issue.severity >= self.review_threshold
    }

    /// Per-detector timeout for this run
    #[inline]
    #[must_use]
    pub fn detector_timeout(&self) -> Duration {
        self.detector_timeout
    }

    /// Review threshold for this run
    #[inline]
    #[must_use]
    pub fn review_threshold(&self) -> Severity {
        self.review_threshold
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            exclude: Vec::new(),
            review_threshold: Severity::Critical,
            detector_timeout: DEFAULT_DETECTOR_TIMEOUT,
        }
    }
}
