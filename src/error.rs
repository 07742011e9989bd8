use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents all possible errors that can occur while generating or patching metadata
#[derive(Error, Debug)]
pub enum MetadataError {
    /// IO errors that occur when reading/writing files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A required input file or directory does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The metadata template is not usable
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// An asset file name could not be interpreted
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// The metadata output directory already holds records and overwriting is disabled
    #[error("Output directory {} already contains {1} metadata records", .0.display())]
    OutputNotEmpty(PathBuf, usize),

    /// The content address handed to the patch phase cannot be used
    #[error("Invalid content address: {0}")]
    InvalidContentAddress(String),

    /// Errors reported by the collection contract
    #[error("Contract error: {0}")]
    Contract(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        MetadataError::Serialization(err.to_string())
    }
}

impl From<String> for MetadataError {
    fn from(err: String) -> Self {
        MetadataError::Other(err)
    }
}

impl From<&str> for MetadataError {
    fn from(err: &str) -> Self {
        MetadataError::Other(err.to_string())
    }
}
