use thiserror::Error;

#[derive(Error, Debug)]
pub enum KlareError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage engine error: {0}")]
    Engine(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),
}

pub type Result<T> = std::result::Result<T, KlareError>;
