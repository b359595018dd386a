use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use serde::{Serialize, de::DeserializeOwned};

/// Error type for I/O operations
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("IO error: {0}")]
    StdIo(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Encodes `data` with bincode into `writer`
pub fn serialize_into<W: Write, T: Serialize + ?Sized>(writer: W, data: &T) -> Result<(), IoError> {
    bincode::serialize_into(writer, data)?;
    Ok(())
}

/// Decodes a bincode value from `reader`
pub fn deserialize_from<R: Read, T: DeserializeOwned>(reader: R) -> Result<T, IoError> {
    Ok(bincode::deserialize_from(reader)?)
}

/// Opens a file for buffered reading
pub fn open_file(path: impl AsRef<Path>) -> Result<BufReader<File>, IoError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IoError::FileNotFound(path.to_path_buf())
        } else {
            IoError::StdIo(e)
        }
    })?;
    Ok(BufReader::new(file))
}

/// Serializes data to a binary file, creating parent directories if needed
pub fn serialize_to_file<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    data: &T,
) -> Result<(), IoError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serialize_into(&mut writer, data)?;
    writer.flush()?;
    Ok(())
}
