//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy.
///
/// Every error that crosses a crate boundary reduces to one of these
/// kinds; the HTTP layer maps the kind to a status code and a
/// `{"error", "details"?}` body.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing field, bad date, negative amount.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, expired, or invalid token.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid token, insufficient role.
    #[error("{0}")]
    Forbidden(String),

    /// Resource or attachment absent.
    #[error("{0}")]
    NotFound(String),

    /// Natural-key uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    /// Database failure.
    #[error("database error: {0}")]
    Database(String),

    /// File store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Anything else; detail stays server-side.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error kind.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// True for kinds whose detail must not be echoed to the caller.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        self.status_code() == 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Validation(String::new()), 400)]
    #[case(AppError::Unauthorized(String::new()), 401)]
    #[case(AppError::Forbidden(String::new()), 403)]
    #[case(AppError::NotFound(String::new()), 404)]
    #[case(AppError::Conflict(String::new()), 409)]
    #[case(AppError::Database(String::new()), 500)]
    #[case(AppError::Storage(String::new()), 500)]
    #[case(AppError::Internal(String::new()), 500)]
    fn status_codes(#[case] err: AppError, #[case] expected: u16) {
        assert_eq!(err.status_code(), expected);
    }

    #[test]
    fn internal_kinds_are_flagged() {
        assert!(AppError::Database("boom".into()).is_internal());
        assert!(AppError::Storage("boom".into()).is_internal());
        assert!(AppError::Internal("boom".into()).is_internal());
        assert!(!AppError::Validation("bad".into()).is_internal());
        assert!(!AppError::NotFound("gone".into()).is_internal());
    }

    #[test]
    fn display_carries_the_message() {
        assert_eq!(
            AppError::Validation("amount must not be negative".into()).to_string(),
            "amount must not be negative"
        );
        assert_eq!(
            AppError::Database("pool exhausted".into()).to_string(),
            "database error: pool exhausted"
        );
    }
}
