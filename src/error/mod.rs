use thiserror::Error;

#[derive(Error, Debug)]
pub enum MirrorDnaError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("duplicate entry '{id}' in collection '{collection}'")]
    DuplicateEntry { collection: String, id: String },

    #[error("invalid record format: {0}")]
    InvalidFormat(String),

    #[error("checksum computation failed: {0}")]
    ComputationFailed(String),

    #[error("malformed vault URI: {0}")]
    MalformedUri(String),

    #[error("lineage break: expected predecessor {expected}, got {actual}")]
    LineageBreak { expected: String, actual: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported checksum kind: {0}")]
    UnsupportedKind(String),

    #[error("storage read failed for collection '{collection}': {reason}")]
    StorageRead { collection: String, reason: String },

    #[error("storage write failed for collection '{collection}': {reason}")]
    StorageWrite { collection: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MirrorDnaError>;
