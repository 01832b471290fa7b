pub mod health;
pub mod documents;
pub mod session;

pub use health::*;
pub use documents::*;
pub use session::*;

use axum::{http::StatusCode, Json};

use crate::error::{RepoError, SessionError};
use crate::models::ErrorResponse;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(status, message)))
}

pub(crate) fn session_error(err: &SessionError) -> ApiError {
    let status = match err {
        SessionError::InvalidDocumentId(_) => StatusCode::BAD_REQUEST,
        SessionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        SessionError::Superseded(_) | SessionError::NoActiveSession => StatusCode::CONFLICT,
        SessionError::Repo(RepoError::Unavailable(_) | RepoError::Uninitialized(_)) => {
            StatusCode::NOT_FOUND
        }
        SessionError::Repo(RepoError::NotReady(_)) => StatusCode::CONFLICT,
        SessionError::Repo(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, err.to_string())
}
