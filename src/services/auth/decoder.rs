/*
 * Responsibility
 * - The "verify + decode" capability the guard consumes (signature, exp, nbf, ...)
 * - Typed decode failures with a short, client-safe reason label
 *
 * Notes
 * - The concrete JWT implementation lives in `jwt.rs`; the guard only sees this trait
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::claims::ClaimsPayload;

/// Why a raw credential could not be turned into verified claims.
///
/// `Display` is for logs. Responses use [`DecodeError::reason`], which never
/// carries library or token text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,
    #[error("invalid claims: {0}")]
    InvalidClaims(String),
    #[error("decoder returned no claims")]
    EmptyPayload,
    #[error("decode failed: {0}")]
    Other(String),
}

impl DecodeError {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "malformed",
            Self::InvalidSignature => "invalid signature",
            Self::Expired => "expired",
            Self::NotYetValid => "not yet valid",
            Self::UnsupportedAlgorithm => "unsupported algorithm",
            Self::InvalidClaims(_) => "invalid claims",
            Self::EmptyPayload => "empty payload",
            Self::Other(_) => "unverifiable",
        }
    }
}

/// Verifies a raw credential and returns its claims.
///
/// Implementations must be idempotent and free of side effects. `Ok(None)`
/// ("nothing decoded, no error") is accepted from implementations but the
/// guard treats it exactly like a failure.
#[async_trait]
pub trait ClaimsDecoder: Send + Sync {
    async fn decode(&self, raw_credential: &str) -> Result<Option<ClaimsPayload>, DecodeError>;
}
