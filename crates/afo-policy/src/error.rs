//! Policy errors
//!
//! Everything here is a configuration error in the run taxonomy: fatal, the
//! run never starts.

use afo_model::UnknownCategory;
use std::path::PathBuf;

/// Errors producing a policy snapshot
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Configuration file could not be read
    #[error("cannot read policy file {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML
    #[error("invalid policy file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Exclusion pattern does not compile
    #[error("invalid exclusion pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Offending pattern text
        pattern: String,
        /// Underlying glob error
        #[source]
        source: glob::PatternError,
    },

    /// Category key not recognized
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}
