use std::sync::Arc;
use std::time::Duration;

use auth::JwtHandler;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::activate::activate_account;
use super::handlers::activate::verify_email;
use super::handlers::change_password::change_password;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::logout::logout_everywhere;
use super::handlers::password_reset::request_password_reset;
use super::handlers::password_reset::reset_password;
use super::handlers::profile::me;
use super::handlers::register::register;
use super::handlers::two_factor::disable_two_factor;
use super::handlers::two_factor::enable_two_factor;
use super::handlers::two_factor::request_two_factor_code;
use super::middleware::require_session;
use crate::domain::auth::service::AuthService;
use crate::domain::session::service::SessionRegistry;
use crate::domain::two_factor::service::TwoFactorService;
use crate::outbound::email::PostmarkEmailSender;
use crate::outbound::repositories::PostgresCredentialRepository;
use crate::outbound::repositories::PostgresLoginAttemptRepository;
use crate::outbound::repositories::PostgresPasswordHistoryRepository;
use crate::outbound::repositories::PostgresRecoveryTokenRepository;
use crate::outbound::repositories::PostgresSessionRepository;
use crate::outbound::repositories::PostgresTwoFactorConfigRepository;
use crate::outbound::repositories::PostgresTwoFactorRateLimitRepository;

pub type StaffAuthService = AuthService<
    PostgresCredentialRepository,
    PostgresSessionRepository,
    PostgresLoginAttemptRepository,
    PostgresPasswordHistoryRepository,
    PostgresRecoveryTokenRepository,
    PostmarkEmailSender,
>;

pub type StaffTwoFactorService = TwoFactorService<
    PostgresTwoFactorConfigRepository,
    PostgresTwoFactorRateLimitRepository,
    PostmarkEmailSender,
>;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<StaffAuthService>,
    pub two_factor: Arc<StaffTwoFactorService>,
    pub sessions: Arc<SessionRegistry<PostgresSessionRepository>>,
    pub credentials: Arc<PostgresCredentialRepository>,
    pub codec: Arc<JwtHandler>,
}

pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/password-reset/request", post(request_password_reset))
        .route("/api/auth/password-reset", post(reset_password))
        .route("/api/auth/activate", post(activate_account))
        .route("/api/auth/verify-email", post(verify_email));

    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/logout-all", post(logout_everywhere))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/2fa/request-code", post(request_two_factor_code))
        .route("/api/auth/2fa/enable", post(enable_two_factor))
        .route("/api/auth/2fa/disable", post(disable_two_factor))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
