//! Session/token lifecycle engine and role gate.
//!
//! This crate has no HTTP dependency. Storage is reached only
//! through the [`TokenStore`] trait; the cache-backed implementation lives in
//! `campus-infra`.

pub mod authorize;
pub mod claims;
pub mod codec;
pub mod credentials;
pub mod error;
pub mod lifecycle;
pub mod principal;
pub mod roles;
pub mod store;

pub use authorize::{authorize, AuthzError};
pub use claims::{validate_claims, TokenClaims, TokenKind, TokenValidationError};
pub use codec::ClaimsCodec;
pub use credentials::{
    CredentialError, CredentialVerifier, Credentials, InMemoryCredentialVerifier,
};
pub use error::TokenError;
pub use lifecycle::{TokenLifecycle, TokenPair};
pub use principal::{Principal, SubjectId};
pub use roles::{IdentityNamespace, Role};
pub use store::{InMemoryTokenStore, Revocation, StoreError, TokenStore};
