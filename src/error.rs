// error.rs
use thiserror::Error;

use crate::model::ModelError;
use crate::utils::io::IoError;

#[derive(Error, Debug)]
pub enum ParamStoreError {
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl From<std::io::Error> for ParamStoreError {
    fn from(e: std::io::Error) -> Self {
        ParamStoreError::Io(IoError::StdIo(e))
    }
}

impl From<bincode::Error> for ParamStoreError {
    fn from(e: bincode::Error) -> Self {
        ParamStoreError::Io(IoError::Serialization(e))
    }
}

impl ParamStoreError {
    /// True when the saved data does not fit the model it was loaded into
    pub fn is_structure_mismatch(&self) -> bool {
        matches!(
            self,
            ParamStoreError::Model(ModelError::StructureMismatch(_))
        )
    }
}
