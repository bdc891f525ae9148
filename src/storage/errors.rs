use thiserror::Error;

/// 存储层错误
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or refused the request.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// A stored item is missing attributes or holds values that cannot be
    /// mapped back to a record.
    #[error("Corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller's cancellation signal fired before the backend answered.
    #[error("Storage operation cancelled")]
    Cancelled,
}
