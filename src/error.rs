use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChapterizeError {
    #[error("Audio processing failed: {0}")]
    Audio(String),

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Upstream contract violated: {0}")]
    ContractViolation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChapterizeError>;
