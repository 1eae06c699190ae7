use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::IssuedSession;
use crate::domain::auth::models::LoginCommand;
use crate::domain::auth::models::StaffProfile;
use crate::inbound::http::router::AppState;

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let command = LoginCommand {
        national_id: body.national_id,
        password: body.password,
        ip: addr.ip().to_string(),
        user_agent: user_agent(&headers),
    };

    state
        .auth_service
        .login(command)
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::OK, session.into()))
}

pub(super) fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    national_id: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResponseData {
    pub token: String,
    pub expires_in_secs: i64,
    pub staff: StaffData,
}

impl From<&IssuedSession> for SessionResponseData {
    fn from(session: &IssuedSession) -> Self {
        Self {
            token: session.token.clone(),
            expires_in_secs: session.expires_in_secs,
            staff: (&session.staff).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffData {
    pub id: String,
    pub national_id: String,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub email_verified: bool,
}

impl From<&StaffProfile> for StaffData {
    fn from(profile: &StaffProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            national_id: profile.national_id.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role.to_string(),
            email_verified: profile.email_verified,
        }
    }
}
