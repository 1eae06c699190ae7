use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::login::user_agent;
use super::login::SessionResponseData;
use super::ApiError;
use super::ApiSuccess;
use crate::domain::auth::models::RegisterCommand;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<ApiSuccess<SessionResponseData>, ApiError> {
    let command = RegisterCommand {
        national_id: body.national_id,
        email: body.email,
        full_name: body.full_name,
        password: body.password,
        role: body.role,
        temporary_password: body.temporary_password.unwrap_or(false),
        ip: addr.ip().to_string(),
        user_agent: user_agent(&headers),
    };

    state
        .auth_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|ref session| ApiSuccess::new(StatusCode::CREATED, session.into()))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    national_id: String,
    email: String,
    full_name: String,
    password: String,
    role: Option<String>,
    temporary_password: Option<bool>,
}
