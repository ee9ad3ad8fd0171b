use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApertureError {
    #[error("annotation not found: {0}")]
    NotFound(String),

    #[error("image decode error: {0}")]
    ImageDecode(String),

    #[error("image encode error: {0}")]
    ImageEncode(String),

    #[error("feature extraction error: {0}")]
    FeatureExtraction(String),

    #[error("invalid entry {key}: {reason}")]
    InvalidEntry { key: String, reason: String },

    #[error("annotation counter corrupt: {0}")]
    CounterCorrupt(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ApertureError>;
