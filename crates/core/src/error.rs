use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("empty input: at least one metric row is required")]
    EmptyInput,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed JSON is a caller mistake, so it surfaces as `InvalidInput`.
impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        PulseError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PulseError>;
