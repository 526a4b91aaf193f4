//! HS256 claims codec.
//!
//! Pure over its inputs and the signing secret: no I/O, no locks. Access-token
//! verification on the request path goes through here and nothing else.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{validate_claims, TokenClaims, TokenKind};
use crate::{Role, SubjectId, TokenError};

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Signs and verifies [`TokenClaims`] with one process-wide symmetric secret.
///
/// Cheap to clone; clones share the same key material. Changing the secret
/// invalidates every outstanding token.
#[derive(Clone)]
pub struct ClaimsCodec {
    keys: Arc<Keys>,
    validation: Validation,
}

impl core::fmt::Debug for ClaimsCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClaimsCodec").finish_non_exhaustive()
    }
}

impl ClaimsCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let secret = secret.as_ref();

        // Expiry is checked by `validate_claims` against an explicit clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            validation,
        }
    }

    pub fn issue(&self, subject: &SubjectId, role: Role, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_at(subject, role, kind, Utc::now())
    }

    /// Sign a token as if issued at `now`.
    pub fn issue_at(
        &self,
        subject: &SubjectId,
        role: Role,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = TokenClaims::new(subject.clone(), role, kind, now);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Check the signature, then the time window against `now`.
    ///
    /// A bad signature always wins over expiry: a forged token is reported as
    /// invalid even when its claimed `exp` is in the past.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.keys.decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "token failed signature/structure check");
                TokenError::SignatureInvalid
            })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }

    /// Read claims without checking signature or expiry.
    ///
    /// Only for bookkeeping and audit logging. Never authorize on the result.
    pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|d| d.claims)
    }
}
