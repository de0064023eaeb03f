//! HTTP error responses.
//!
//! Every handler returns `Result<_, ApiError>`. The conversions in this
//! module collapse the repository and domain error types onto the shared
//! [`AppError`] taxonomy, and the single [`IntoResponse`] impl renders the
//! `{"error", "details"?}` body. Internal failures (500) are logged with
//! full detail and answered with a generic body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tresorerie_core::auth::PasswordError;
use tresorerie_core::fiscal::UnknownTimezone;
use tresorerie_core::storage::StorageError;
use tresorerie_core::validate::InputError;
use tresorerie_db::repositories::{
    AttachmentError, BudgetError, ExpenseAccountError, InvoiceError, UserError,
};
use tresorerie_shared::{AppError, JwtError};

/// Wrapper giving [`AppError`] an HTTP rendering and a `From` impl per
/// lower-layer error type.
#[derive(Debug)]
pub struct ApiError(AppError);

impl ApiError {
    #[must_use]
    pub fn validation(details: impl Into<String>) -> Self {
        Self(AppError::Validation(details.into()))
    }

    #[must_use]
    pub fn unauthorized(details: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(details.into()))
    }

    #[must_use]
    pub fn forbidden(details: impl Into<String>) -> Self {
        Self(AppError::Forbidden(details.into()))
    }

    #[must_use]
    pub fn not_found(details: impl Into<String>) -> Self {
        Self(AppError::NotFound(details.into()))
    }

    /// Stable machine-readable label for the error kind.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.0 {
            AppError::Validation(_) => "validation_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                "internal_error"
            }
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::unauthorized("token has expired"),
            JwtError::Invalid => Self::unauthorized("invalid token"),
            JwtError::Encoding(detail) => Self(AppError::Internal(detail)),
        }
    }
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<UnknownTimezone> for ApiError {
    fn from(err: UnknownTimezone) -> Self {
        Self(AppError::Internal(err.to_string()))
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self(AppError::Storage(err.to_string()))
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::NotFound(_) => Self::not_found(err.to_string()),
            // A dangling reference in the request body is a client error,
            // not an absent addressed resource.
            InvoiceError::ExpenseAccountNotFound(_) => Self::validation(err.to_string()),
            InvoiceError::Storage(e) => Self(AppError::Storage(e.to_string())),
            InvoiceError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl From<ExpenseAccountError> for ApiError {
    fn from(err: ExpenseAccountError) -> Self {
        match err {
            ExpenseAccountError::NotFound(_) => Self::not_found(err.to_string()),
            ExpenseAccountError::MissingGlobalCode => Self::validation(err.to_string()),
            ExpenseAccountError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::OwnerNotFound(_)
            | AttachmentError::NotFound { .. }
            | AttachmentError::Unavailable { .. } => Self::not_found(err.to_string()),
            AttachmentError::Storage(e) => Self(AppError::Storage(e.to_string())),
            AttachmentError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        match err {
            BudgetError::NotFound(_) => Self::not_found(err.to_string()),
            BudgetError::DuplicateLine { .. } => Self(AppError::Conflict(err.to_string())),
            BudgetError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => Self::not_found(err.to_string()),
            UserError::DuplicateEmail(_) | UserError::InUse(_) => {
                Self(AppError::Conflict(err.to_string()))
            }
            UserError::Database(e) => Self(AppError::Database(e.to_string())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = if self.0.is_internal() {
            // Full detail stays in the server log.
            tracing::error!(error = %self.0, "request failed");
            json!({ "error": self.label() })
        } else {
            json!({ "error": self.label(), "details": self.0.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::validation("bad"), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(ApiError::unauthorized("no"), StatusCode::UNAUTHORIZED, "unauthorized")]
    #[case(ApiError::forbidden("no"), StatusCode::FORBIDDEN, "forbidden")]
    #[case(ApiError::not_found("gone"), StatusCode::NOT_FOUND, "not_found")]
    fn labels_and_statuses(
        #[case] err: ApiError,
        #[case] status: StatusCode,
        #[case] label: &str,
    ) {
        assert_eq!(err.label(), label);
        assert_eq!(err.into_response().status(), status);
    }

    #[test]
    fn expired_and_invalid_tokens_are_distinguished() {
        let expired = ApiError::from(JwtError::Expired);
        let invalid = ApiError::from(JwtError::Invalid);
        assert_eq!(expired.0.to_string(), "token has expired");
        assert_eq!(invalid.0.to_string(), "invalid token");
    }

    #[test]
    fn internal_errors_hide_their_detail() {
        let err = ApiError::from(AppError::Database("password in a panic".into()));
        assert!(err.0.is_internal());
        assert_eq!(err.label(), "internal_error");
    }

    #[test]
    fn duplicate_budget_line_is_a_conflict() {
        let err = ApiError::from(BudgetError::DuplicateLine {
            fiscal_year: 2025,
            fund_type: "fonds_courant".into(),
            revenue_type: "subvention".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn missing_bytes_read_as_not_found() {
        let err = ApiError::from(AttachmentError::Unavailable {
            owner_id: uuid::Uuid::new_v4(),
            file_index: 2,
        });
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
