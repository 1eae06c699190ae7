use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::credential::ports::CredentialRepository;
use crate::inbound::http::middleware::AuthenticatedStaff;
use crate::inbound::http::router::AppState;

pub async fn request_two_factor_code(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
) -> Result<ApiSuccess<TwoFactorResponseData>, ApiError> {
    let credential = state
        .credentials
        .find_by_id(&staff.credential_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))?;

    state
        .two_factor
        .request_code(&credential)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::ACCEPTED,
        TwoFactorResponseData { enabled: None },
    ))
}

pub async fn enable_two_factor(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Json(body): Json<TwoFactorCodeRequest>,
) -> Result<ApiSuccess<TwoFactorResponseData>, ApiError> {
    state
        .two_factor
        .enable(&staff.credential_id, &body.code)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        TwoFactorResponseData {
            enabled: Some(true),
        },
    ))
}

pub async fn disable_two_factor(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
    Json(body): Json<TwoFactorCodeRequest>,
) -> Result<ApiSuccess<TwoFactorResponseData>, ApiError> {
    state
        .two_factor
        .disable(&staff.credential_id, &body.code)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        TwoFactorResponseData {
            enabled: Some(false),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TwoFactorCodeRequest {
    code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TwoFactorResponseData {
    /// Present on enable/disable; absent for code requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}
