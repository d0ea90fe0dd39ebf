use thiserror::Error;

/// Errors produced by the catalog store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("book not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("catalog snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog snapshot is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
