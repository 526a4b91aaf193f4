use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{Role, SubjectId};

/// Access tokens live for 15 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh tokens live for 7 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Tolerated clock drift between the issuing and verifying hosts.
pub const CLOCK_SKEW_SECS: i64 = 60;

/// Extra blacklist lifetime past a token's `exp`.
const BLACKLIST_MARGIN_SECS: i64 = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            TokenKind::Refresh => Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl core::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by every signed token.
///
/// Never mutated after signing; verification reconstructs a fresh copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject identifier.
    pub sub: SubjectId,

    /// Access or refresh.
    pub kind: TokenKind,

    /// Role snapshot at issuance.
    pub role: Role,

    /// Issued-at timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// Expiration timestamp.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,

    /// Unique token id, so two tokens minted in the same second never collide.
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn new(sub: SubjectId, role: Role, kind: TokenKind, now: DateTime<Utc>) -> Self {
        Self {
            sub,
            kind,
            role,
            iat: now,
            exp: now + kind.lifetime(),
            jti: Uuid::now_v7(),
        }
    }

    /// Time left before natural expiry, rounded up to whole seconds plus a
    /// one-second margin; never less than one second.
    ///
    /// Used as the TTL of blacklist entries, which must outlive the token.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> std::time::Duration {
        let millis = (self.exp - now).num_milliseconds();
        let secs = if millis <= 0 {
            1
        } else {
            (millis + 999) / 1000 + BLACKLIST_MARGIN_SECS
        };
        std::time::Duration::from_secs(secs as u64)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

/// Deterministically validate the time window of already-decoded claims.
pub fn validate_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now + Duration::seconds(CLOCK_SKEW_SECS) < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(kind: TokenKind, now: DateTime<Utc>) -> TokenClaims {
        TokenClaims::new(SubjectId::new("u1").unwrap(), Role::Student, kind, now)
    }

    #[test]
    fn lifetimes_are_fixed_per_kind() {
        let now = Utc::now();
        assert_eq!(claims(TokenKind::Access, now).exp - now, Duration::minutes(15));
        assert_eq!(claims(TokenKind::Refresh, now).exp - now, Duration::days(7));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let c = claims(TokenKind::Access, now);
        assert_eq!(validate_claims(&c, now), Ok(()));
        assert_eq!(validate_claims(&c, c.exp - Duration::seconds(1)), Ok(()));
        assert_eq!(validate_claims(&c, c.exp), Err(TokenValidationError::Expired));
    }

    #[test]
    fn future_issued_tokens_are_rejected_beyond_skew() {
        let now = Utc::now();
        let c = claims(TokenKind::Access, now + Duration::seconds(30));
        assert_eq!(validate_claims(&c, now), Ok(()));

        let c = claims(TokenKind::Access, now + Duration::minutes(5));
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let mut c = claims(TokenKind::Refresh, now);
        c.exp = c.iat;
        assert_eq!(validate_claims(&c, now), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn remaining_lifetime_is_clamped_to_one_second() {
        let now = Utc::now();
        let c = claims(TokenKind::Refresh, now);
        assert_eq!(c.remaining_lifetime(now).as_secs(), REFRESH_TOKEN_TTL_SECS as u64 + 1);
        assert_eq!(c.remaining_lifetime(c.exp).as_secs(), 1);
        assert_eq!(c.remaining_lifetime(c.exp + Duration::hours(1)).as_secs(), 1);
    }

    #[test]
    fn remaining_lifetime_outlives_fractional_expiry() {
        let now = Utc::now();
        let c = claims(TokenKind::Refresh, now);

        // 1.2 s left must not round down to 1 s.
        let at = c.exp - Duration::milliseconds(1200);
        let ttl = c.remaining_lifetime(at);
        assert_eq!(ttl.as_secs(), 3);
        assert!(at + Duration::from_std(ttl).unwrap() > c.exp);

        for left_ms in [1, 999, 1000, 1001, 59_999] {
            let at = c.exp - Duration::milliseconds(left_ms);
            let ttl = Duration::from_std(c.remaining_lifetime(at)).unwrap();
            assert!(at + ttl > c.exp, "ttl too short with {left_ms} ms left");
        }
    }

    #[test]
    fn timestamps_serialize_as_unix_seconds() {
        let now = Utc::now();
        let c = claims(TokenKind::Access, now);
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["iat"], now.timestamp());
        assert_eq!(json["kind"], "access");
        assert_eq!(json["role"], "STUDENT");
    }
}
