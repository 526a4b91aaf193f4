use thiserror::Error;

use crate::claims::{TokenKind, TokenValidationError};
use crate::store::StoreError;

/// Failures of token issuance, verification and rotation.
///
/// `Expired` and `SignatureInvalid` stay distinct all the way to the caller:
/// an expired token can be silently refreshed, an invalid one forces a login.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token")]
    SignatureInvalid,

    #[error("expected a {expected} token, got a {found} token")]
    TokenKindMismatch { expected: TokenKind, found: TokenKind },

    #[error("refresh token has been revoked")]
    RefreshTokenBlacklisted,

    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    #[error("token signing failed: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::NotYetValid | TokenValidationError::InvalidTimeWindow => {
                TokenError::SignatureInvalid
            }
        }
    }
}
