use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SocError {
    #[error("source file not found: {0}")]
    SourceFileMissing(String),
    #[error("key not found: {key} (available: {})", .available.join(", "))]
    KeyNotFound { key: String, available: Vec<String> },
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("cycle {position} could not be processed: {reason}")]
    CycleProcessing { position: usize, reason: String },
    #[error("unwrapping exceeded depth bound of {0}")]
    UnwrapDepthExceeded(usize),
    #[error("read error: {0}")]
    Read(String),
    #[error("model artifact not found: {0}")]
    ModelArtifactMissing(String),
    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),
    #[error("expected {expected} features, got {received}")]
    FeatureCountMismatch { expected: usize, received: usize },
    #[error("model not loaded")]
    ModelUnavailable,
    #[error("model error: {0}")]
    Model(String),
    #[error("not enough rows to train: need {required}, have {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SocError {
    fn from(e: std::io::Error) -> Self {
        SocError::Io(e.to_string())
    }
}

impl From<soc_reader::ReadError> for SocError {
    fn from(e: soc_reader::ReadError) -> Self {
        SocError::Read(e.to_string())
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
