//! Issue categories and severities
//!
//! Categories partition the remediation space: every issue belongs to exactly
//! one category, and every fixer claims exactly one. `Category::ALL` fixes the
//! enumeration order used wherever determinism matters (fixer sequencing,
//! report output).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Issue category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Code formatting (whitespace, line length)
    Formatting,
    /// Import/use ordering
    ImportOrder,
    /// Static analysis findings
    Lint,
    /// Security findings
    Security,
    /// Outdated or unpinned dependencies
    Dependency,
    /// Dockerfile best practices
    Docker,
    /// Commit message quality
    CommitQuality,
    /// Configuration file issues
    Config,
    /// Project-specific detectors
    Custom,
}

impl Category {
    /// All categories in stable enumeration order
    pub const ALL: [Category; 9] = [
        Category::Formatting,
        Category::ImportOrder,
        Category::Lint,
        Category::Security,
        Category::Dependency,
        Category::Docker,
        Category::CommitQuality,
        Category::Config,
        Category::Custom,
    ];

    /// Stable string form (used as config key)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Formatting => "formatting",
            Category::ImportOrder => "import-order",
            Category::Lint => "lint",
            Category::Security => "security",
            Category::Dependency => "dependency",
            Category::Docker => "docker",
            Category::CommitQuality => "commit-quality",
            Category::Config => "config",
            Category::Custom => "custom",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a category name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Issue severity, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic, safe to fix unattended
    Low,
    /// Worth fixing, low blast radius
    Medium,
    /// Likely to affect behavior
    High,
    /// Must never be applied without human sign-off
    Critical,
}

impl Severity {
    /// Stable string form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a severity name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(UnknownSeverity(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_str_round_trip() {
        for cat in Category::ALL {
            assert_eq!(cat.as_str().parse::<Category>().unwrap(), cat);
        }
    }

    #[test]
    fn category_unknown() {
        let err = "nonsense".parse::<Category>().unwrap_err();
        assert_eq!(err, UnknownCategory("nonsense".to_string()));
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn severity_parse() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert!("urgent".parse::<Severity>().is_err());
    }

    #[test]
    fn category_serde_kebab_case() {
        let json = serde_json::to_string(&Category::ImportOrder).unwrap();
        assert_eq!(json, "\"import-order\"");
    }
}
