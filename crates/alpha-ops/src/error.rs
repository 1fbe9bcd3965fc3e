//! Error types for operator computations.

use thiserror::Error;

/// Result type for operator calls.
pub type Result<T> = std::result::Result<T, OperatorError>;

/// Errors that can occur while applying a cross-sectional operator.
///
/// Degenerate rows (all-NaN, zero-sum, zero-range) are never errors; they
/// produce NaN or infinite values following each operator's formula.
#[derive(Debug, Error)]
pub enum OperatorError {
    /// Input array is neither rank 1 nor rank 2
    #[error("Shape error: expected a rank-1 or rank-2 array, got rank {0}")]
    InvalidRank(usize),

    /// Rows of a would-be rank-2 input have different lengths
    #[error("Shape error: row {row} has {found} values, expected {expected}")]
    RaggedRows {
        /// Index of the offending row
        row: usize,
        /// Length of the first row
        expected: usize,
        /// Length of the offending row
        found: usize,
    },

    /// Inputs of a multi-input operator disagree on shape
    #[error("Shape error: input shapes differ, {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Shape of the first input
        left: Vec<usize>,
        /// Shape of the disagreeing input
        right: Vec<usize>,
    },

    /// Reshape failure from ndarray
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// A scalar configuration value is out of its domain
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Wrong number of inputs passed through the dynamic interface
    #[error("Operator `{operator}` takes {expected} input(s), got {found}")]
    InvalidArity {
        /// Operator name
        operator: String,
        /// Number of inputs the operator takes
        expected: usize,
        /// Number of inputs supplied
        found: usize,
    },

    /// Operator not found in registry
    #[error("Operator not found: {0}")]
    NotFound(String),

    /// Frame cannot be read as a panel
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// I/O error while reading or writing panels
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars DataFrame error
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Operator parameters could not be decoded
    #[error("Parameter decoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Date label could not be parsed
    #[error("Date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

impl OperatorError {
    /// Reject a scalar parameter unless `ok` holds.
    pub(crate) fn require(ok: bool, name: &'static str, reason: &str) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(Self::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        }
    }

    /// Whether this error reports a malformed input shape.
    pub const fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRank(_)
                | Self::RaggedRows { .. }
                | Self::ShapeMismatch { .. }
                | Self::Shape(_)
        )
    }
}
