use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::login::StaffData;
use super::ApiError;
use super::ApiSuccess;
use crate::inbound::http::middleware::AuthenticatedStaff;
use crate::inbound::http::router::AppState;

pub async fn me(
    State(state): State<AppState>,
    Extension(staff): Extension<AuthenticatedStaff>,
) -> Result<ApiSuccess<StaffData>, ApiError> {
    state
        .auth_service
        .profile(&staff.credential_id)
        .await
        .map_err(ApiError::from)
        .map(|ref profile| ApiSuccess::new(StatusCode::OK, profile.into()))
}
