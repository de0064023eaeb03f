//! Storage error types.

use thiserror::Error;

/// Errors from the file store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No bytes live under the given key.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// The backend could not be initialized.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// The backend accepted the request but the operation failed.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// True when the underlying bytes are simply absent. Callers use this to
    /// tell a missing file apart from an unhealthy backend.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::operation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        assert!(StorageError::not_found("invoices/2025/x.pdf").is_not_found());
        assert!(!StorageError::operation("disk on fire").is_not_found());
    }

    #[test]
    fn display_includes_the_path() {
        let err = StorageError::not_found("invoices/2025/x.pdf");
        assert_eq!(err.to_string(), "file not found: invoices/2025/x.pdf");
    }
}
