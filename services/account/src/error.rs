use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::domain::validation::FieldErrors;

/// Account service error variants.
///
/// Lookups by email never surface [`AccountError::UserNotFound`]; they map to
/// `IncorrectCredentials` or `InvalidCode` so responses cannot reveal whether
/// an address is registered.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation failed")]
    ValidationFailed(FieldErrors),
    #[error("user already exists")]
    Conflict,
    #[error("incorrect email or password")]
    IncorrectCredentials,
    #[error("invalid code")]
    InvalidCode,
    #[error("code has expired")]
    CodeExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("account is inactive")]
    AccountInactive,
    #[error("email not verified")]
    EmailNotVerified,
    #[error("too many requests")]
    TooManyRequests,
    #[error("user not found")]
    UserNotFound,
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::Conflict => "CONFLICT",
            Self::IncorrectCredentials => "INCORRECT_CREDENTIALS",
            Self::InvalidCode => "INVALID_CODE",
            Self::CodeExpired => "CODE_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationFailed(_)
            | Self::InvalidCode
            | Self::CodeExpired
            | Self::BadRequest(_)
            | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict => StatusCode::CONFLICT,
            Self::IncorrectCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::AccountInactive | Self::EmailNotVerified => StatusCode::FORBIDDEN,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Log 500s only. The cause stays out of the body.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        let mut body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Self::ValidationFailed(ref fields) = self {
            body["fields"] = serde_json::to_value(fields).unwrap_or_default();
        }
        (status, axum::Json(body)).into_response()
    }
}
