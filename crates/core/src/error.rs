use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to decode record {index}: {reason}")]
    Decode { index: usize, reason: String },

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
