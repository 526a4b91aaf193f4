//! Session endpoints: login, refresh rotation, logout, identity.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Extension, Json, Router,
};

use campus_auth::{Credentials, TokenPair};
use tracing::{info, warn};

use crate::app::dto::{LoginRequest, LoginResponse, LogoutAllResponse, MeResponse, RefreshRequest};
use crate::app::errors::ApiError;
use crate::app::AppState;
use crate::context::PrincipalContext;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// `/auth` routes that authenticate by credentials or by the refresh token
/// itself.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

/// `/auth` routes that need a verified access token.
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/logout-all", post(logout_all))
}

/// POST /auth/login - exchange credentials for a fresh pair
pub async fn login(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let credentials = credentials_from(&body)?;
    let verifier = state.verifier.clone();
    let lifecycle = state.lifecycle.clone();

    tokio::task::spawn_blocking(move || {
        let (subject, role) = verifier.verify(&credentials).map_err(|e| {
            warn!(
                error = %e,
                namespace = %credentials.namespace,
                identifier = %credentials.identifier,
                "login refused"
            );
            ApiError::from(e)
        })?;
        let tokens = lifecycle.issue_pair(&subject, role)?;
        info!(subject = %subject, role = %role, "login succeeded");

        Ok::<_, ApiError>(Json(LoginResponse {
            subject_id: subject.to_string(),
            role,
            tokens,
        }))
    })
    .await?
}

/// POST /auth/refresh - rotate a refresh token into a fresh pair
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TokenPair>, ApiError> {
    let token = refresh_token_from(&headers, &body)?;
    let lifecycle = state.lifecycle.clone();

    let pair = tokio::task::spawn_blocking(move || lifecycle.refresh(&token)).await??;
    Ok(Json(pair))
}

/// POST /auth/logout - revoke one refresh token
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let token = refresh_token_from(&headers, &body)?;
    let lifecycle = state.lifecycle.clone();

    tokio::task::spawn_blocking(move || lifecycle.revoke(&token)).await??;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me(Extension(principal): Extension<PrincipalContext>) -> Json<MeResponse> {
    Json(MeResponse {
        subject_id: principal.subject_id().to_string(),
        role: principal.role(),
        namespace: principal.namespace(),
    })
}

/// POST /auth/logout-all - revoke every active refresh token of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let subject = principal.subject_id().clone();
    let role = principal.role();

    let revoked = tokio::task::spawn_blocking(move || lifecycle.revoke_all(&subject, role)).await??;
    Ok(Json(LogoutAllResponse { revoked }))
}

fn credentials_from(body: &[u8]) -> Result<Credentials, ApiError> {
    let request: LoginRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?;

    let identifier = request.identifier.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("identifier and password are required"));
    }

    Ok(Credentials {
        namespace: request.namespace,
        identifier: identifier.to_string(),
        secret: request.password,
    })
}

/// Header wins over body; an empty body is treated as "no body".
fn refresh_token_from(headers: &HeaderMap, body: &[u8]) -> Result<String, ApiError> {
    if let Some(value) = headers.get(REFRESH_TOKEN_HEADER) {
        let token = value
            .to_str()
            .map_err(|_| ApiError::bad_request("x-refresh-token header is not valid text"))?
            .trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        RefreshRequest::default()
    } else {
        serde_json::from_slice::<RefreshRequest>(body)
            .map_err(|e| ApiError::bad_request(format!("invalid request body: {e}")))?
    };

    request
        .refresh_token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("refresh token is required"))
}
