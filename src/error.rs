//! Error types for the file reader

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileReaderError {
    /// No registered backend handles this extension.
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// The backend refused to open the file.
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// The file opened but contains no recordings.
    #[error("Empty file: {0}")]
    EmptyFile(String),

    #[error("No file selected")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Control error: {0}")]
    Control(String),
}

impl FileReaderError {
    /// Human-readable message sent to the status sink for this error.
    pub fn status_message(&self) -> String {
        match self {
            Self::UnsupportedFormat(_) => "File type not supported".to_string(),
            Self::InvalidFile(_) => "Invalid file".to_string(),
            Self::EmptyFile(_) => "Empty file. Ignoring open operation".to_string(),
            Self::NotReady => "No file selected in File Reader.".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FileReaderError>;
