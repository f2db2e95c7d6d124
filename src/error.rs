use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Couldn't create output directory {}: {message}", path.display())]
    OutputDirectory { path: PathBuf, message: String },

    #[error("Couldn't open file {} for output: {source}", path.display())]
    OutputFile { path: PathBuf, source: io::Error },

    #[error("MoMo tag buffer length exceeded at template offset {offset}")]
    TagOverflow { offset: usize },

    #[error("Unterminated template tag starting at offset {offset}")]
    UnterminatedTag { offset: usize },

    #[error("Invalid motif {id}: {message}")]
    InvalidMotif { id: String, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;

impl ReportError {
    /// Create a new OutputDirectory error
    pub fn output_directory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReportError::OutputDirectory {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new OutputFile error
    pub fn output_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ReportError::OutputFile {
            path: path.into(),
            source,
        }
    }

    /// Create a new InvalidMotif error
    pub fn invalid_motif(id: impl Into<String>, message: impl Into<String>) -> Self {
        ReportError::InvalidMotif {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ReportError::InvalidInput(message.into())
    }
}
