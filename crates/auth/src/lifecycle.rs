//! Token lifecycle: issuance, rotate-on-use refresh, revocation.
//!
//! Refresh token states: issued -> active -> {rotated | revoked} ->
//! blacklisted (self-expiring) -> gone. Only an active token can be rotated.
//! The manager itself holds no mutable state; everything lives in the
//! [`TokenStore`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::claims::{TokenClaims, TokenKind, REFRESH_TOKEN_TTL_SECS};
use crate::store::{Revocation, TokenStore};
use crate::{ClaimsCodec, IdentityNamespace, Principal, Role, SubjectId, TokenError};

/// Access + refresh pair handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenLifecycle {
    codec: ClaimsCodec,
    store: Arc<dyn TokenStore>,
}

impl core::fmt::Debug for TokenLifecycle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenLifecycle")
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl TokenLifecycle {
    pub fn new(codec: ClaimsCodec, store: Arc<dyn TokenStore>) -> Self {
        Self { codec, store }
    }

    pub fn codec(&self) -> &ClaimsCodec {
        &self.codec
    }

    /// Mint a fresh pair and record the refresh token as active.
    #[instrument(skip_all, fields(subject_id = %subject, role = %role), err)]
    pub fn issue_pair(&self, subject: &SubjectId, role: Role) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(subject, role, Utc::now())
    }

    fn issue_pair_at(
        &self,
        subject: &SubjectId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, TokenError> {
        let access_token = self.codec.issue_at(subject, role, TokenKind::Access, now)?;
        let refresh_token = self.codec.issue_at(subject, role, TokenKind::Refresh, now)?;

        self.store.record_active(
            role.namespace(),
            subject,
            &refresh_token,
            Duration::from_secs(REFRESH_TOKEN_TTL_SECS as u64),
        )?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new pair, invalidating the old one.
    ///
    /// The namespace comes from the role embedded in the token, not from the
    /// subject's current role. A store failure aborts before any new token is
    /// handed out.
    #[instrument(skip_all, err)]
    pub fn refresh(&self, old_refresh_token: &str) -> Result<TokenPair, TokenError> {
        if self.store.is_blacklisted(old_refresh_token)? {
            let subject = ClaimsCodec::decode_unverified(old_refresh_token).map(|c| c.sub);
            warn!(subject_id = ?subject, "blacklisted refresh token presented");
            return Err(TokenError::RefreshTokenBlacklisted);
        }

        let now = Utc::now();
        let claims = self.codec.verify_at(old_refresh_token, now)?;
        expect_kind(&claims, TokenKind::Refresh)?;

        let namespace = claims.role.namespace();
        let outcome = self.store.revoke(
            namespace,
            &claims.sub,
            old_refresh_token,
            claims.remaining_lifetime(now),
        )?;
        if outcome == Revocation::AlreadyRevoked {
            warn!(subject_id = %claims.sub, "lost refresh rotation race");
            return Err(TokenError::RefreshTokenBlacklisted);
        }

        let pair = self.issue_pair_at(&claims.sub, claims.role, now)?;
        info!(subject_id = %claims.sub, role = %claims.role, %namespace, "refresh token rotated");
        Ok(pair)
    }

    /// Stateless check for the request path: signature, expiry, kind.
    pub fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = self.codec.verify(token)?;
        expect_kind(&claims, TokenKind::Access)?;
        Ok(Principal::new(claims.sub, claims.role))
    }

    /// Explicit logout of one refresh token. Revoking twice is not an error.
    #[instrument(skip_all, err)]
    pub fn revoke(&self, refresh_token: &str) -> Result<Revocation, TokenError> {
        let now = Utc::now();
        let claims = self.codec.verify_at(refresh_token, now)?;
        expect_kind(&claims, TokenKind::Refresh)?;

        let outcome = self.store.revoke(
            claims.role.namespace(),
            &claims.sub,
            refresh_token,
            claims.remaining_lifetime(now),
        )?;
        info!(subject_id = %claims.sub, ?outcome, "refresh token revoked");
        Ok(outcome)
    }

    /// Active refresh tokens of a subject, sorted.
    pub fn active_sessions(
        &self,
        namespace: IdentityNamespace,
        subject: &SubjectId,
    ) -> Result<Vec<String>, TokenError> {
        let mut sessions: Vec<String> = self.store.list_active(namespace, subject)?.into_iter().collect();
        sessions.sort();
        Ok(sessions)
    }

    /// Log a subject out everywhere. Returns how many tokens this call revoked.
    #[instrument(skip_all, fields(subject_id = %subject, role = %role), err)]
    pub fn revoke_all(&self, subject: &SubjectId, role: Role) -> Result<usize, TokenError> {
        let namespace = role.namespace();
        let now = Utc::now();
        let mut revoked = 0;

        for token in self.store.list_active(namespace, subject)? {
            // Tokens that no longer verify still leave the active set.
            let ttl = self
                .codec
                .verify_at(&token, now)
                .map(|c| c.remaining_lifetime(now))
                .unwrap_or(Duration::from_secs(1));

            if self.store.revoke(namespace, subject, &token, ttl)? == Revocation::Revoked {
                revoked += 1;
            }
        }

        info!(revoked, "revoked all refresh tokens");
        Ok(revoked)
    }
}

fn expect_kind(claims: &TokenClaims, expected: TokenKind) -> Result<(), TokenError> {
    if claims.kind != expected {
        return Err(TokenError::TokenKindMismatch {
            expected,
            found: claims.kind,
        });
    }
    Ok(())
}
