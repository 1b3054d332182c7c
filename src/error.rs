use thiserror::Error;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Host storage error: {0}")]
    Host(String),

    #[error("Invalid record: {0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StashError>;
