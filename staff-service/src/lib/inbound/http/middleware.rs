use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

use crate::domain::credential::models::CredentialId;
use crate::domain::credential::models::StaffRole;
use crate::domain::credential::ports::CredentialRepository;
use crate::domain::session::models::SessionId;
use crate::inbound::http::router::AppState;

/// Extension type carrying the authenticated staff member's identity.
#[derive(Debug, Clone)]
pub struct AuthenticatedStaff {
    pub credential_id: CredentialId,
    pub session_id: SessionId,
    pub national_id: String,
    pub role: StaffRole,
    /// The bearer token of this request; some flows need it to spare the
    /// current session from revocation.
    pub token: String,
}

/// Hybrid authorization gate.
///
/// A request is authenticated only when BOTH checks pass: the token codec
/// verifies the signature and expiry, and the session registry confirms the
/// session was not revoked. Neither check subsumes the other.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_token_from_header(&req)?.to_string();

    let claims = state.codec.verify(&token).map_err(|e| {
        tracing::warn!(error = %e, "Token verification failed");
        unauthorized("Invalid or expired token")
    })?;

    if !state.sessions.is_valid(&token).await {
        tracing::warn!("Valid token presented for a revoked or expired session");
        return Err(unauthorized("Invalid or expired token"));
    }

    let session = state
        .sessions
        .find_by_token(&token)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| unauthorized("Invalid or expired token"))?;

    let credential = state
        .credentials
        .find_by_id(&session.credential_id)
        .await
        .ok()
        .flatten()
        .ok_or_else(|| unauthorized("Invalid or expired token"))?;

    // The token's subject must still match the credential the session
    // points at
    if credential.national_id.as_str() != claims.sub || !credential.active {
        return Err(unauthorized("Invalid or expired token"));
    }

    req.extensions_mut().insert(AuthenticatedStaff {
        credential_id: credential.id,
        session_id: session.id,
        national_id: claims.sub,
        role: credential.role,
        token,
    });

    Ok(next.run(req).await)
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": message })),
    )
        .into_response()
}

fn extract_token_from_header(req: &Request) -> Result<&str, Response> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or_else(|| unauthorized("Missing Authorization header"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    if !auth_str.starts_with("Bearer ") {
        return Err(unauthorized(
            "Invalid Authorization header format. Expected: Bearer <token>",
        ));
    }

    Ok(auth_str.trim_start_matches("Bearer "))
}
