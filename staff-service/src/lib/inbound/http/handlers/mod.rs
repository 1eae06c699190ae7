use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde::Serialize;

use crate::domain::errors::AuthError;

pub mod activate;
pub mod change_password;
pub mod login;
pub mod logout;
pub mod password_reset;
pub mod profile;
pub mod register;
pub mod two_factor;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    /// 423: the account is locked; carries a retry hint in seconds.
    Locked(String, i64),
    /// 429: a send or validation quota is exhausted; carries a retry hint.
    TooManyRequests(String, i64),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg, None),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::Locked(msg, retry) => (StatusCode::LOCKED, msg, Some(retry)),
            ApiError::TooManyRequests(msg, retry) => {
                (StatusCode::TOO_MANY_REQUESTS, msg, Some(retry))
            }
        };

        let mut response =
            (status, Json(ApiResponseBody::new_error(status, message))).into_response();
        if let Some(retry) = retry_after {
            if let Ok(value) = retry.to_string().parse() {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::TokenInvalidOrExpired
            | AuthError::Unauthorized => ApiError::Unauthorized(err.to_string()),
            AuthError::AccountLocked { retry_after_secs } => {
                ApiError::Locked(err.to_string(), retry_after_secs)
            }
            AuthError::RateLimitExceeded { retry_after_secs } => {
                ApiError::TooManyRequests(err.to_string(), retry_after_secs)
            }
            AuthError::AccountInactive | AuthError::AccountNotActivated => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::PasswordPolicyViolation(_)
            | AuthError::InvalidCredentialId(_)
            | AuthError::InvalidNationalId(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidRole(_) => ApiError::UnprocessableEntity(err.to_string()),
            AuthError::PasswordReused | AuthError::DuplicateIdentity => {
                ApiError::Conflict(err.to_string())
            }
            AuthError::SessionNotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::Database(_) | AuthError::Email(_) | AuthError::Internal(_) => {
                ApiError::InternalServerError(err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
