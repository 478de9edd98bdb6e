use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("not a level-5 MAT file: {0}")]
    Header(String),
    #[error("truncated element at byte {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("malformed element at byte {offset}: {reason}")]
    Malformed { offset: usize, reason: String },
    #[error("unsupported array class: {0}")]
    UnsupportedClass(String),
    #[error("nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("zlib inflate failed: {0}")]
    Inflate(String),
    #[error("unsupported file extension: {0:?}")]
    UnsupportedFormat(String),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReadError>;
