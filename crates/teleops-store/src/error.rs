use std::io;

/// Errors for document store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("field {path:?} is not an array")]
    NotAnArray { path: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
}
