//! Administrative session inspection.
//!
//! Mounted under `/admin` behind the `PLATFORM_ADMINS` role gate.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use campus_auth::{IdentityNamespace, SubjectId};

use crate::app::dto::SessionsResponse;
use crate::app::errors::ApiError;
use crate::app::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/sessions/:namespace/:subject_id", get(list_sessions))
}

/// GET /admin/sessions/:namespace/:subject_id - active refresh tokens of a subject
pub async fn list_sessions(
    State(state): State<AppState>,
    Path((namespace, subject_id)): Path<(String, String)>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let namespace: IdentityNamespace = namespace
        .parse()
        .map_err(|e: campus_auth::roles::UnknownNamespace| ApiError::bad_request(e.to_string()))?;
    let subject = SubjectId::new(subject_id).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let lifecycle = state.lifecycle.clone();
    let lookup = subject.clone();
    let sessions =
        tokio::task::spawn_blocking(move || lifecycle.active_sessions(namespace, &lookup)).await??;

    Ok(Json(SessionsResponse {
        namespace,
        subject_id: subject.to_string(),
        sessions,
    }))
}
