use thiserror::Error;

/// Central error type for the notarizer
#[derive(Error, Debug)]
pub enum NotarizerError {
    // ============================================================================
    // Stability Errors
    // ============================================================================
    #[error("File is not stable after {attempts} attempts: {path}")]
    FileUnstable { path: String, attempts: u32 },

    #[error("Failed to read size of {path}: {reason}")]
    StabilityCheckFailed { path: String, reason: String },

    // ============================================================================
    // Hashing Errors
    // ============================================================================
    #[error("Failed to calculate hash of {path}: {reason}")]
    HashingFailed { path: String, reason: String },

    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    // ============================================================================
    // Ledger Errors
    // ============================================================================
    #[error("Ledger not configured: {0}")]
    LedgerNotConfigured(String),

    #[error("Invalid notarization payload: {0}")]
    InvalidPayload(String),

    // ============================================================================
    // Receipt Errors
    // ============================================================================
    #[error("Failed to create receipt: {0}")]
    ReceiptFailed(String),

    // ============================================================================
    // Watcher Errors
    // ============================================================================
    #[error("Failed to watch directory: {0}")]
    WatcherError(String),

    // ============================================================================
    // File System Errors
    // ============================================================================
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to create directory: {0}")]
    DirectoryCreationFailed(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// Builder pattern validation error
    #[error("Builder error: {0}")]
    BuilderError(String),
}

impl From<notify::Error> for NotarizerError {
    fn from(err: notify::Error) -> Self {
        NotarizerError::WatcherError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for NotarizerError {
    fn from(err: tokio::task::JoinError) -> Self {
        NotarizerError::Internal(format!("Blocking task failed: {}", err))
    }
}

pub type NotarizerResult<T> = Result<T, NotarizerError>;
