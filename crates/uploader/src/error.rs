//! Error types for storage calls and the two orchestrators.

/// A call to the storage collaborator failed.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// An upload attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("negotiation failed: {0}")]
    Negotiation(#[source] StorageError),

    #[error("transfer failed: {0}")]
    Transfer(#[source] StorageError),

    #[error("transfer rejected with status {0}")]
    UnexpectedStatus(u16),
}

/// A remote delete failed; the entry is kept as failed.
#[derive(Debug, thiserror::Error)]
#[error("delete of {key} failed: {source}")]
pub struct DeletionError {
    pub key: String,
    #[source]
    pub source: StorageError,
}

/// Errors surfaced by [`FileUploader`](crate::FileUploader).
#[derive(Debug, thiserror::Error)]
pub enum UploaderError {
    /// The dropped batch was rejected before any I/O.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}
