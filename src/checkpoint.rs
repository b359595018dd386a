use std::io::{Read, Write};
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::error::ParamStoreError;
use crate::model::{DenseState, LookupState, Model, ModelSnapshot};
use crate::utils::io::{self, IoError};

/// Writes the values of every parameter of `model` to `writer`.
///
/// Layout: dense count, lookup count, then `{dim, values}` for every dense
/// parameter and every lookup table, each kind in creation order.
pub fn save_to_writer<W: Write>(writer: W, model: &Model) -> Result<(), ParamStoreError> {
    io::serialize_into(writer, &model.snapshot())?;
    Ok(())
}

/// Reads values written by [`save_to_writer`] into the existing parameters of
/// `model`. The counts are checked before the parameter data is read; no
/// value is modified unless the whole structure matches.
pub fn load_from_reader<R: Read>(mut reader: R, model: &mut Model) -> Result<(), ParamStoreError> {
    let num_parameters: usize = io::deserialize_from(&mut reader)?;
    let num_lookup_parameters: usize = io::deserialize_from(&mut reader)?;
    if let Err(e) = model.check_counts(num_parameters, num_lookup_parameters) {
        warn!(error = %e, "saved model does not match");
        return Err(e.into());
    }

    let parameters: Vec<DenseState> = io::deserialize_from(&mut reader)?;
    let lookup_parameters: Vec<LookupState> = io::deserialize_from(&mut reader)?;
    model.restore(ModelSnapshot {
        num_parameters,
        num_lookup_parameters,
        parameters,
        lookup_parameters,
    })?;
    Ok(())
}

// Save model parameters
#[instrument(skip_all, fields(
    path = %path.as_ref().display(),
    parameters = model.num_parameters(),
    lookup_parameters = model.num_lookup_parameters(),
))]
pub fn save_model(path: impl AsRef<Path>, model: &Model) -> Result<(), ParamStoreError> {
    io::serialize_to_file(path, &model.snapshot())?;
    info!(size = model.total_size(), "saved model parameters");
    Ok(())
}

// Load model parameters into an already built model
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_model(path: impl AsRef<Path>, model: &mut Model) -> Result<(), ParamStoreError> {
    load_from_reader(io::open_file(path)?, model)?;
    info!(
        parameters = model.num_parameters(),
        lookup_parameters = model.num_lookup_parameters(),
        "loaded model parameters"
    );
    Ok(())
}
