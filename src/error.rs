use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Failures surfaced to API callers.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email")]
    InvalidEmail,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Incorrect verification code")]
    UnknownCode,

    #[error("User already verified")]
    AlreadyVerified,

    #[error("Incorrect email")]
    UnknownEmail,

    #[error("Incorrect password")]
    InvalidPassword,

    #[error("Email not verified")]
    NotVerified,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("No exercise with this id")]
    UnknownExercise,

    /// Body missing, not JSON, or missing fields. Keeps the extractor's status.
    #[error("{1}")]
    InvalidBody(StatusCode, String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidEmail
            | AuthError::DuplicateEmail
            | AuthError::UnknownCode
            | AuthError::UnknownEmail
            | AuthError::UnknownExercise => StatusCode::BAD_REQUEST,
            AuthError::InvalidBody(status, _) => *status,
            AuthError::AlreadyVerified => StatusCode::CONFLICT,
            AuthError::InvalidPassword => StatusCode::NOT_FOUND,
            AuthError::NotVerified => StatusCode::FORBIDDEN,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        AuthError::InvalidBody(rejection.status(), rejection.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AuthError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_distinct_statuses() {
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::UnknownCode.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AlreadyVerified.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::UnknownEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidPassword.status(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::NotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::UnknownExercise.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn body_errors_keep_status_and_render_json() {
        let err = AuthError::InvalidBody(
            StatusCode::UNPROCESSABLE_ENTITY,
            "missing field `password`".into(),
        );
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "missing field `password`");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AuthError::from(anyhow::anyhow!("connection refused on 10.0.0.5"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
