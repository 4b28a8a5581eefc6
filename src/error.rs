//! Error types for contour evaluation

use thiserror::Error;

/// Result type for contour operations
pub type Result<T> = std::result::Result<T, ContourError>;

/// Errors that abort a contour evaluation before any value is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContourError {
    /// A queried frequency is negative (or not a number)
    #[error("Invalid frequency at position {index}: {value} Hz (must be >= 0 Hz)")]
    InvalidFrequency { index: usize, value: f64 },

    /// The mirror row used for the 20 kHz anchor does not exist
    #[error("Mirror index {index} is out of range for a table of {len} rows")]
    MirrorIndexOutOfRange { index: usize, len: usize },

    /// A reference table breaks its ordering or shape invariants
    #[error("Invalid reference table: {0}")]
    InvalidTable(String),

    /// A cubic fit needs at least four knots
    #[error("Cubic interpolation needs at least 4 knots, got {count}")]
    TooFewKnots { count: usize },

    /// The spline memo lock was poisoned by a panicking thread
    #[error("spline cache poisoned")]
    Poisoned,
}

impl<T> From<std::sync::PoisonError<T>> for ContourError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ContourError::Poisoned
    }
}
