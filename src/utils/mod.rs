//! Utility functions for the param_store crate
pub mod io;

pub use io::{open_file, serialize_to_file, IoError};
