//! Parameter storage for neural network models.
//!
//! A [`Model`] owns every learnable parameter: dense [`Parameters`] updated
//! on every step and sparse [`LookupParameters`] updated only at the rows a
//! computation touched. Optimizers walk the model's views through the
//! [`ParameterEntity`] trait; [`checkpoint`] persists and restores values.

pub mod checkpoint;
pub use checkpoint::{load_from_reader, load_model, save_model, save_to_writer};

pub mod model;
pub use model::{
    DenseHandle, Dim, InitConfig, LookupHandle, LookupParameters, Model, ModelError,
    ParameterEntity, Parameters,
};

pub mod utils;

pub mod error;
pub use error::ParamStoreError;
