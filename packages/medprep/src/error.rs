use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Input not found: {0}")]
    NotFound(String),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Failed to decode image {file}: {reason}")]
    DecodeFailure { file: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PrepError {
    /// Map an `io::Error` raised while opening `path` to `NotFound` when the
    /// file is absent, keeping every other failure as `IoError`.
    pub fn from_open(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            PrepError::NotFound(path.display().to_string())
        } else {
            PrepError::IoError(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, PrepError>;
