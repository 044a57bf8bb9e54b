use thiserror::Error;

#[derive(Error, Debug)]
pub enum FraudDbError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Pending upload '{id}' not found")]
    UploadNotFound { id: String },

    #[error("Upload '{id}' is {status}; only pending uploads can transition")]
    InvalidUploadState { id: String, status: String },

    #[error("No usable rows in batch")]
    EmptyBatch,

    #[error("Column mapping is missing a required '{field}' column")]
    MissingColumn { field: &'static str },

    #[error("Tag 'default' requires a default balance")]
    MissingDefaultBalance,

    #[error("Unknown report tag '{tag}'")]
    InvalidTag { tag: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type FraudDbResult<T> = Result<T, FraudDbError>;
