//! Uniform error responses.
//!
//! Every failure leaves the API as
//! `{statusCode, error, message, details?, path, method, timestamp}`.
//! `ApiError::into_response` renders the first four and stashes itself in the
//! response extensions; `middleware::error_envelope` then re-renders it with
//! the request's path and method.

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use campus_auth::{AuthzError, CredentialError, TokenError};

#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            message,
        )
    }

    /// Envelope body; `request` adds path, method and timestamp.
    pub fn body(&self, request: Option<(&Method, &str)>) -> Value {
        let mut body = Map::new();
        body.insert("statusCode".into(), json!(self.status.as_u16()));
        body.insert("error".into(), json!(self.code));
        body.insert("message".into(), json!(self.message));
        if let Some(details) = &self.details {
            body.insert("details".into(), details.clone());
        }
        if let Some((method, path)) = request {
            body.insert("path".into(), json!(path));
            body.insert("method".into(), json!(method.as_str()));
            body.insert(
                "timestamp".into(),
                json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        Value::Object(body)
    }

    pub fn into_response_for(self, method: &Method, path: &str) -> Response {
        let body = self.body(Some((method, path)));
        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body(None))).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match &err {
            TokenError::Expired => {
                ApiError::new(StatusCode::UNAUTHORIZED, "EXPIRED_TOKEN", "Token has expired")
            }
            TokenError::SignatureInvalid => {
                ApiError::new(StatusCode::UNAUTHORIZED, "INVALID_TOKEN", "Invalid token")
            }
            TokenError::TokenKindMismatch { expected, found } => ApiError::new(
                StatusCode::FORBIDDEN,
                "TOKEN_KIND_MISMATCH",
                err.to_string(),
            )
            .with_details(json!({
                "expected": expected.as_str(),
                "found": found.as_str(),
            })),
            TokenError::RefreshTokenBlacklisted => ApiError::new(
                StatusCode::FORBIDDEN,
                "REFRESH_TOKEN_BLACKLISTED",
                "Refresh token has been revoked; please log in again",
            ),
            TokenError::StoreUnavailable(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "Session store unavailable; try again later",
            ),
            // Signing detail stays in the logs.
            TokenError::Signing(_) => ApiError::internal("Internal server error"),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthorized => {
                ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Authentication required")
            }
            AuthzError::Forbidden { role } => ApiError::new(
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Insufficient role for this operation",
            )
            .with_details(json!({ "role": role.as_str() })),
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidCredentials => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid identifier or password",
            ),
            CredentialError::Deactivated => ApiError::new(
                StatusCode::FORBIDDEN,
                "ACCOUNT_DEACTIVATED",
                "Account is deactivated",
            ),
            CredentialError::Unavailable(_) => ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "CREDENTIALS_UNAVAILABLE",
                "Credential store unavailable; try again later",
            ),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "blocking task failed");
        ApiError::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use campus_auth::{Role, StoreError, TokenKind};

    use super::*;

    #[test]
    fn expired_and_invalid_stay_distinct() {
        let expired = ApiError::from(TokenError::Expired);
        let invalid = ApiError::from(TokenError::SignatureInvalid);
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);
        assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
        assert_eq!(expired.code, "EXPIRED_TOKEN");
        assert_eq!(invalid.code, "INVALID_TOKEN");
    }

    #[test]
    fn token_errors_map_to_status_codes() {
        let cases = [
            (
                TokenError::TokenKindMismatch {
                    expected: TokenKind::Refresh,
                    found: TokenKind::Access,
                },
                StatusCode::FORBIDDEN,
                "TOKEN_KIND_MISMATCH",
            ),
            (
                TokenError::RefreshTokenBlacklisted,
                StatusCode::FORBIDDEN,
                "REFRESH_TOKEN_BLACKLISTED",
            ),
            (
                TokenError::StoreUnavailable(StoreError::Unavailable("down".into())),
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
            ),
            (
                TokenError::Signing("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!((api.status, api.code), (status, code));
        }
    }

    #[test]
    fn authz_errors_keep_unauthorized_and_forbidden_apart() {
        assert_eq!(ApiError::from(AuthzError::Unauthorized).code, "UNAUTHORIZED");
        let forbidden = ApiError::from(AuthzError::Forbidden { role: Role::Student });
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.details, Some(json!({ "role": "STUDENT" })));
    }

    #[test]
    fn credential_errors_map_to_status_codes() {
        let cases = [
            (CredentialError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (CredentialError::Deactivated, StatusCode::FORBIDDEN, "ACCOUNT_DEACTIVATED"),
            (
                CredentialError::Unavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "CREDENTIALS_UNAVAILABLE",
            ),
        ];

        for (err, status, code) in cases {
            let api = ApiError::from(err);
            assert_eq!((api.status, api.code), (status, code));
        }
    }

    #[test]
    fn envelope_includes_request_fields_only_when_known() {
        let err = ApiError::bad_request("missing refresh token");

        let bare = err.body(None);
        assert_eq!(bare["statusCode"], 400);
        assert_eq!(bare["error"], "BAD_REQUEST");
        assert!(bare.get("path").is_none());
        assert!(bare.get("details").is_none());

        let full = err.body(Some((&Method::POST, "/auth/refresh")));
        assert_eq!(full["path"], "/auth/refresh");
        assert_eq!(full["method"], "POST");
        assert!(full["timestamp"].as_str().is_some());
    }
}
