//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: token store selection, lifecycle and credential verifier
//!   construction
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: the uniform error envelope

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;

use campus_auth::{CredentialVerifier, TokenLifecycle};

use crate::{middleware, policy};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<TokenLifecycle>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(
    lifecycle: Arc<TokenLifecycle>,
    verifier: Arc<dyn CredentialVerifier>,
) -> Router {
    let auth_state = middleware::AuthState {
        lifecycle: lifecycle.clone(),
    };

    // Each group carries its own role gate; authentication wraps all of them.
    let protected = Router::new()
        .nest(
            "/auth",
            routes::auth::protected_router().route_layer(axum::middleware::from_fn_with_state(
                policy::AUTHENTICATED,
                middleware::require_roles,
            )),
        )
        .nest(
            "/admin",
            routes::admin::router().route_layer(axum::middleware::from_fn_with_state(
                policy::PLATFORM_ADMINS,
                middleware::require_roles,
            )),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(routes::public_router())
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::error_envelope)))
        .with_state(AppState {
            lifecycle,
            verifier,
        })
}
