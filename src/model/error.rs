use thiserror::Error;

use super::Dim;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: Dim, found: Dim },

    #[error("Index out of range: row {index} of a table with {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Structure mismatch: {0}")]
    StructureMismatch(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl ModelError {
    pub fn structure<E: std::fmt::Display>(error: E) -> Self {
        ModelError::StructureMismatch(error.to_string())
    }

    pub(crate) fn check_dim(expected: Dim, found: Dim) -> Result<(), ModelError> {
        if expected == found {
            Ok(())
        } else {
            Err(ModelError::DimensionMismatch { expected, found })
        }
    }
}
