use axum::Router;

use crate::app::AppState;

pub mod admin;
pub mod auth;
pub mod system;

/// Routes reachable without a verified principal.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/health", axum::routing::get(system::health))
        .nest("/auth", auth::public_router())
}
