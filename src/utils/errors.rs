use std::fmt;
use std::error::Error;

/// Represents errors that can occur while building or evaluating a space-partitioning tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SpTreeError {
    /// Indicates that a tree was requested over zero points or zero dimensions.
    EmptyPointSet,
    /// Indicates that a buffer or row length does not match the expected length.
    DimensionMismatch { expected: usize, actual: usize },
    /// Indicates a NaN or infinite coordinate in the given point.
    NonFiniteCoordinate { index: usize },
    /// Indicates a point or column index past the end of the point set.
    IndexOutOfBounds { index: usize, len: usize },
    /// Indicates a malformed argument, e.g. a broken CSR offset array.
    InvalidArgument(String),
    /// Indicates a negative or NaN approximation threshold.
    InvalidTheta(f64),
    /// Indicates that a point fell outside the root cell while building a tree.
    InsertionRejected { index: usize },
}

impl fmt::Display for SpTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpTreeError::EmptyPointSet => write!(f, "Point set is empty"),
            SpTreeError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {}, got {}", expected, actual)
            }
            SpTreeError::NonFiniteCoordinate { index } => {
                write!(f, "Point {} has a non-finite coordinate", index)
            }
            SpTreeError::IndexOutOfBounds { index, len } => {
                write!(f, "Index {} out of bounds for {} points", index, len)
            }
            SpTreeError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            SpTreeError::InvalidTheta(theta) => write!(f, "Invalid theta value: {}", theta),
            SpTreeError::InsertionRejected { index } => {
                write!(f, "Point {} lies outside the root cell", index)
            }
        }
    }
}

impl Error for SpTreeError {}
