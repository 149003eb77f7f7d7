//! Error types for Diverso operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

/// Main error type for Diverso operations.
///
/// Covers hierarchy construction, diversity scoring, and the clustering loop.
/// Only [`DiversoError::UnknownConcept`] signals a caller precondition violation
/// that must surface; the remaining variants are recoverable and the clustering
/// loop treats them as graceful termination conditions.
///
/// # Examples
///
/// ```
/// use diverso::error::DiversoError;
///
/// let err = DiversoError::UnknownConcept {
///     item: "a1x".to_string(),
/// };
/// assert!(err.to_string().contains("a1x"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum DiversoError {
    /// Hierarchy path was empty or malformed at insert time.
    InvalidPath {
        /// What was wrong with the path
        reason: String,
    },

    /// A leaf name was absent from a code map during diversity scoring.
    ///
    /// Signals a hierarchy/data mismatch; silently defaulting the score would
    /// corrupt clustering quality, so this must propagate to the caller.
    UnknownConcept {
        /// The missing leaf name
        item: String,
    },

    /// No itemset cleared the minimum support threshold.
    NoFrequentItemset {
        /// The threshold that nothing met
        min_support: f64,
    },

    /// Best merge candidate shares no dimensions; merging stops.
    DegenerateMerge,

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },
}

impl DiversoError {
    /// Convenience constructor for [`DiversoError::InvalidPath`].
    #[must_use]
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        DiversoError::InvalidPath {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`DiversoError::UnknownConcept`].
    #[must_use]
    pub fn unknown_concept(item: impl Into<String>) -> Self {
        DiversoError::UnknownConcept { item: item.into() }
    }
}

impl fmt::Display for DiversoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiversoError::InvalidPath { reason } => {
                write!(f, "Invalid hierarchy path: {reason}")
            }
            DiversoError::UnknownConcept { item } => {
                write!(
                    f,
                    "Unknown concept '{item}': leaf is absent from the hierarchy code map"
                )
            }
            DiversoError::NoFrequentItemset { min_support } => {
                write!(f, "No itemset meets minimum support {min_support}")
            }
            DiversoError::DegenerateMerge => {
                write!(f, "Best merge candidate shares no dimensions")
            }
            DiversoError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
        }
    }
}

impl std::error::Error for DiversoError {}

/// Result type alias for Diverso operations.
pub type Result<T> = std::result::Result<T, DiversoError>;
