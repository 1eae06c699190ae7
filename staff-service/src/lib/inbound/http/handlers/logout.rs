use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedStaff;
use crate::inbound::http::router::AppState;

/// Revoke the session this request rode in on.
pub async fn logout(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError> {
    state
        .sessions
        .revoke(&staff.session_id, &staff.credential_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LogoutResponseData { revoked: 1 },
    ))
}

/// Revoke every session of the authenticated staff member.
pub async fn logout_everywhere(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError> {
    let revoked = state
        .sessions
        .revoke_all(&staff.credential_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LogoutResponseData { revoked },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub revoked: u64,
}
