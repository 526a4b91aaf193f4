use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use campus_auth::{Role, TokenLifecycle};

use crate::app::errors::ApiError;
use crate::authz::authorize_request;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub lifecycle: Arc<TokenLifecycle>,
}

/// Optional authentication.
///
/// No `Authorization` header: the request continues without a principal and
/// `require_roles` decides. A header that is present must carry a valid
/// access token; expired and invalid tokens are rejected with distinct codes.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = match extract_bearer(req.headers())? {
        Some(token) => Some(state.lifecycle.verify_access(token).map_err(|e| {
            warn!(error = %e, path = %req.uri().path(), "access token rejected");
            ApiError::from(e)
        })?),
        None => None,
    };

    if let Some(principal) = principal {
        req.extensions_mut().insert(PrincipalContext::new(principal));
    }

    Ok(next.run(req).await)
}

/// Role gate for a route group; the state is the group's required-role set.
pub async fn require_roles(
    State(required): State<&'static [Role]>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(e) = authorize_request(req.extensions().get::<PrincipalContext>(), required) {
        warn!(error = %e, path = %req.uri().path(), "request denied");
        return Err(e.into());
    }

    Ok(next.run(req).await)
}

/// Re-renders `ApiError` responses with the request's path and method.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    match response.extensions().get::<ApiError>().cloned() {
        Some(err) => err.into_response_for(&method, &path),
        None => response,
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let malformed = || {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authorization header must be 'Bearer <token>'",
        )
    };

    let header = header.to_str().map_err(|_| malformed())?;

    let token = header.strip_prefix("Bearer ").ok_or_else(malformed)?.trim();
    if token.is_empty() {
        return Err(malformed());
    }

    Ok(Some(token))
}
