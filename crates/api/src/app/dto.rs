//! Request/response bodies for the auth and admin routes.

use serde::{Deserialize, Serialize};

use campus_auth::{IdentityNamespace, Role, TokenPair};

/// Body of `/auth/login`. `namespace` selects the account table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub namespace: IdentityNamespace,
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub subject_id: String,
    pub role: Role,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Body of `/auth/refresh` and `/auth/logout`; the `x-refresh-token` header
/// is accepted as an alternative.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub subject_id: String,
    pub role: Role,
    pub namespace: IdentityNamespace,
}

#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsResponse {
    pub namespace: IdentityNamespace,
    pub subject_id: String,
    pub sessions: Vec<String>,
}
