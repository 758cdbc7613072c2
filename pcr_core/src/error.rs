use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PcrError {
    /// Buffer index misuse. Not reachable through the public record API.
    #[error("cycle index {index} out of range for a buffer of {len} cycles")]
    OutOfRange { index: usize, len: usize },
    #[error("invalid experiment data: {0}")]
    InvalidData(String),
    #[error("experiment already exists: {0}")]
    DuplicateName(String),
    #[error("experiment not found: {0}")]
    NotFound(String),
    #[error("invalid experiment name {0:?}")]
    InvalidName(String),
    #[error("sensor read failed: {0}")]
    ReadError(String),
    #[error("sensor initialization failed: {0}")]
    InitializationFailure(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("document error: {0}")]
    Document(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PcrError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PcrError>;
