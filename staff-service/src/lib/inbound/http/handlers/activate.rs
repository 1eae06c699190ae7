use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::router::AppState;

/// Activate an admin-provisioned account: consumes the emailed activation
/// token and replaces the temporary password.
pub async fn activate_account(
    State(state): State<AppState>,
    Json(body): Json<ActivateRequest>,
) -> Result<ApiSuccess<ActivationResponseData>, ApiError> {
    state
        .auth_service
        .activate_account(&body.token, &body.new_password)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ActivationResponseData { activated: true },
    ))
}

/// Confirm mailbox control for a self-registered account.
pub async fn verify_email(
    State(state): State<AppState>,
    Json(body): Json<VerifyEmailRequest>,
) -> Result<ApiSuccess<ActivationResponseData>, ApiError> {
    state
        .auth_service
        .verify_email(&body.token)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        ActivationResponseData { activated: true },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivateRequest {
    token: String,
    new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifyEmailRequest {
    token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationResponseData {
    pub activated: bool,
}
