use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use schoolerp_core::{SchoolId, UserId};

use crate::{Principal, Role};

/// Which half of the token pair a set of claims belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived token presented on every request.
    Access,
    /// Longer-lived token only exchanged for a fresh access token.
    Refresh,
}

/// Token claims model (transport-agnostic).
///
/// This is the minimal set of claims expected once a token has been
/// decoded/verified by whatever transport/security layer is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject / user account identifier.
    pub sub: UserId,

    /// School affiliation; absent only for superusers.
    pub school_id: Option<SchoolId>,

    pub role: Role,

    pub kind: TokenKind,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

/// Lifetimes of the two tokens in a pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access: Duration::minutes(5),
            refresh: Duration::days(1),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("expected a {expected:?} token, got a {found:?} token")]
    WrongKind { expected: TokenKind, found: TokenKind },

    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("claims do not describe a valid principal: {0}")]
    InvalidPrincipal(String),

    #[error("token lifetime overflows the clock")]
    LifetimeOverflow,
}

impl TokenClaims {
    /// Claims for a fresh access/refresh pair issued to `principal` at `now`.
    pub fn issue_pair(
        principal: &Principal,
        lifetimes: TokenLifetimes,
        now: DateTime<Utc>,
    ) -> Result<(TokenClaims, TokenClaims), TokenValidationError> {
        let claims = |kind: TokenKind, ttl: Duration| -> Result<_, TokenValidationError> {
            Ok(TokenClaims {
                sub: principal.id(),
                school_id: principal.school(),
                role: principal.role(),
                kind,
                issued_at: now,
                expires_at: expiry(now, ttl)?,
            })
        };
        Ok((
            claims(TokenKind::Access, lifetimes.access)?,
            claims(TokenKind::Refresh, lifetimes.refresh)?,
        ))
    }

    /// Exchange a valid refresh token for new access claims.
    pub fn refresh_access(
        &self,
        lifetimes: TokenLifetimes,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenValidationError> {
        validate_claims(self, TokenKind::Refresh, now)?;
        Ok(TokenClaims {
            kind: TokenKind::Access,
            issued_at: now,
            expires_at: expiry(now, lifetimes.access)?,
            ..self.clone()
        })
    }
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>, TokenValidationError> {
    now.checked_add_signed(ttl).ok_or(TokenValidationError::LifetimeOverflow)
}

/// Deterministically validate token claims.
///
/// Note: this validates the *claims* only. Signature verification / decoding is
/// intentionally outside this crate.
pub fn validate_claims(
    claims: &TokenClaims,
    expected: TokenKind,
    now: DateTime<Utc>,
) -> Result<(), TokenValidationError> {
    if claims.kind != expected {
        return Err(TokenValidationError::WrongKind {
            expected,
            found: claims.kind,
        });
    }
    if claims.expires_at <= claims.issued_at {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.issued_at {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.expires_at {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

impl Principal {
    /// Resolve the request principal from validated access-token claims.
    ///
    /// Tokens are only issued to active accounts, so the principal is active.
    pub fn from_claims(claims: &TokenClaims, now: DateTime<Utc>) -> Result<Self, TokenValidationError> {
        validate_claims(claims, TokenKind::Access, now)?;
        Principal::new(claims.sub, claims.school_id, claims.role)
            .map_err(|e| TokenValidationError::InvalidPrincipal(e.to_string()))
    }
}
