//! External collaborators: template packages, record sources, archives.

pub mod archive;
pub mod docx;
pub mod records;
pub mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MergeError;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("XML error: {0}")]
    Xml(#[from] xml::XmlError),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error in {path}: {reason}")]
    Spreadsheet { path: PathBuf, reason: String },
    #[error("Unsupported data file: {0}")]
    UnsupportedFormat(PathBuf),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Read a whole file, reporting a missing file distinctly.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read(path).map_err(IoError::Io)
}

/// Write `content` to `path`, creating parent directories as needed.
pub fn write_bytes(path: &Path, content: &[u8]) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, content).map_err(IoError::Io)
}
