use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApostilError {
    #[error("XML parsing error at {location}: {message}")]
    XmlParse { message: String, location: String },

    #[error("XML serialization error: {0}")]
    XmlWrite(String),

    #[error("Target document has no root element")]
    EmptyDocument,

    #[error("Input directory '{}' contains no HTML documents", .0.display())]
    NoInputDocuments(PathBuf),

    #[error("Invalid note export '{}': {message}", .path.display())]
    InvalidExport { path: PathBuf, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApostilError>;
