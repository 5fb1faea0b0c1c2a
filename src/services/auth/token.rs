/*
 * Responsibility
 * - PreAuthToken: raw credential + (once verified) its claims, owned by one attempt
 * - AuthenticatedToken: the terminal success artifact (principal, raw credential, roles)
 *
 * Notes
 * - Claims can only be attached from inside the crate, by the guard, after a
 *   successful decode. Nothing outside can build a "verified" PreAuthToken.
 */
use std::collections::BTreeSet;
use std::fmt;

use crate::services::auth::claims::ClaimsPayload;
use crate::services::auth::principal::Principal;

/// A credential that was extracted but not yet resolved to a principal.
#[derive(Clone, PartialEq)]
pub struct PreAuthToken {
    raw_credential: String,
    claims: Option<ClaimsPayload>,
}

impl PreAuthToken {
    pub fn new(raw_credential: impl Into<String>) -> Self {
        Self {
            raw_credential: raw_credential.into(),
            claims: None,
        }
    }

    pub fn raw_credential(&self) -> &str {
        &self.raw_credential
    }

    /// Verified claims; `None` until decode succeeded.
    pub fn claims(&self) -> Option<&ClaimsPayload> {
        self.claims.as_ref()
    }

    pub fn is_verified(&self) -> bool {
        self.claims.is_some()
    }

    /// Attach verified claims. Happens exactly once per token.
    pub(crate) fn attach_claims(mut self, claims: ClaimsPayload) -> Self {
        debug_assert!(self.claims.is_none(), "claims attached twice");
        self.claims = Some(claims);
        self
    }
}

impl fmt::Debug for PreAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The raw credential is a bearer secret; keep it out of logs.
        f.debug_struct("PreAuthToken")
            .field("raw_credential", &"[REDACTED]")
            .field("claims", &self.claims)
            .finish()
    }
}

/// Result of a successful authentication. Immutable.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedToken {
    principal: Principal,
    raw_credential: String,
    authorization_attributes: BTreeSet<String>,
}

impl AuthenticatedToken {
    /// Carries the principal's roles as they were at resolution time.
    pub(crate) fn new(principal: Principal, raw_credential: String) -> Self {
        let authorization_attributes = principal.roles().clone();
        Self {
            principal,
            raw_credential,
            authorization_attributes,
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn identity(&self) -> &str {
        self.principal.identity()
    }

    /// The credential exactly as it was extracted from the request.
    pub fn raw_credential(&self) -> &str {
        &self.raw_credential
    }

    pub fn authorization_attributes(&self) -> &BTreeSet<String> {
        &self.authorization_attributes
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.authorization_attributes.contains(attribute)
    }
}

impl fmt::Debug for AuthenticatedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedToken")
            .field("principal", &self.principal)
            .field("raw_credential", &"[REDACTED]")
            .field("authorization_attributes", &self.authorization_attributes)
            .finish()
    }
}
