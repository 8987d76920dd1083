//! Error types for volume chunking and attribute computation.

use std::fmt;

use crate::DType;

/// Result type for attribute operations.
pub type AttributeResult<T> = Result<T, AttributeError>;

/// Errors that can occur while planning chunks or computing attributes.
///
/// Numeric degeneracies (NaN/Inf from divisions) are deliberately NOT
/// errors: they flow through the computation as data so callers can
/// inspect or clip them.
#[derive(Debug, Clone)]
pub enum AttributeError {
    /// Invalid chunk, kernel, or halo sizing, caught at planning time.
    Configuration { context: String },

    /// A companion volume's shape disagrees with the reference volume.
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        context: String,
    },

    /// The volume's element type is not supported.
    UnsupportedDtype { dtype: DType, context: String },

    /// Error from the underlying numr operation.
    Numr(String),
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { context } => {
                write!(f, "Configuration error: {}", context)
            }
            Self::ShapeMismatch {
                expected,
                actual,
                context,
            } => {
                write!(
                    f,
                    "{}: expected shape {:?}, got {:?}",
                    context, expected, actual
                )
            }
            Self::UnsupportedDtype { dtype, context } => {
                write!(f, "{}: unsupported dtype {:?}", context, dtype)
            }
            Self::Numr(msg) => {
                write!(f, "numr error: {}", msg)
            }
        }
    }
}

impl std::error::Error for AttributeError {}

impl From<numr::error::Error> for AttributeError {
    fn from(err: numr::error::Error) -> Self {
        Self::Numr(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AttributeError::Configuration {
            context: "kernel (1, 1, 25) exceeds volume extent 10 along axis 2".to_string(),
        };
        assert!(err.to_string().contains("kernel"));

        let err = AttributeError::ShapeMismatch {
            expected: vec![2, 2, 8],
            actual: vec![2, 2, 9],
            context: "companion volume".to_string(),
        };
        assert!(err.to_string().contains("[2, 2, 8]"));
        assert!(err.to_string().contains("[2, 2, 9]"));
    }
}
