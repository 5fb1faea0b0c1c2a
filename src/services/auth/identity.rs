/*
 * Responsibility
 * - Read the configured identity claim from verified claims
 * - Ask the UserProvider for the principal and build the AuthenticatedToken
 */
use std::sync::Arc;

use serde_json::Value;

use crate::services::auth::claims::ClaimsPayload;
use crate::services::auth::failure::FailureOutcome;
use crate::services::auth::principal::{Principal, UserLookupError, UserProvider};
use crate::services::auth::token::{AuthenticatedToken, PreAuthToken};

pub const DEFAULT_IDENTITY_CLAIM_KEY: &str = "username";

/// A failing user store is not an authentication outcome; it comes back as `Err`.
#[derive(Debug)]
pub enum Resolution {
    Resolved(AuthenticatedToken),
    Failed(FailureOutcome),
}

pub struct IdentityResolver {
    identity_claim_key: String,
    users: Arc<dyn UserProvider>,
}

impl std::fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("identity_claim_key", &self.identity_claim_key)
            .finish_non_exhaustive()
    }
}

impl IdentityResolver {
    pub fn new(identity_claim_key: impl Into<String>, users: Arc<dyn UserProvider>) -> Self {
        Self {
            identity_claim_key: identity_claim_key.into(),
            users,
        }
    }

    pub fn identity_claim_key(&self) -> &str {
        &self.identity_claim_key
    }

    /// The identity string carried under the configured key.
    ///
    /// Strings are taken as-is and numbers in their decimal form; `null`,
    /// booleans, arrays and objects count as missing.
    pub fn resolve_identity(&self, claims: &ClaimsPayload) -> Result<String, FailureOutcome> {
        match claims.get(&self.identity_claim_key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(FailureOutcome::IdentityMissingInPayload {
                identity_claim_key: self.identity_claim_key.clone(),
            }),
        }
    }

    pub async fn load_principal(&self, identity: &str) -> Result<Principal, LoadError> {
        match self.users.load_principal(identity).await {
            Ok(principal) => Ok(principal),
            Err(UserLookupError::NotFound) => {
                Err(LoadError::Outcome(FailureOutcome::UnresolvableIdentity {
                    identity: identity.to_string(),
                    identity_claim_key: self.identity_claim_key.clone(),
                }))
            }
            Err(e @ UserLookupError::Unavailable(_)) => Err(LoadError::Lookup(e)),
        }
    }

    /// The resulting token keeps principal, raw credential and roles; claims
    /// are not carried over. `token` must carry verified claims.
    pub async fn resolve(&self, token: &PreAuthToken) -> Result<Resolution, UserLookupError> {
        let Some(claims) = token.claims() else {
            // Unreachable through the guard, which only passes verified tokens.
            return Ok(Resolution::Failed(FailureOutcome::DecodeFailure(None)));
        };

        let identity = match self.resolve_identity(claims) {
            Ok(identity) => identity,
            Err(outcome) => return Ok(Resolution::Failed(outcome)),
        };

        match self.load_principal(&identity).await {
            Ok(principal) => Ok(Resolution::Resolved(AuthenticatedToken::new(
                principal,
                token.raw_credential().to_string(),
            ))),
            Err(LoadError::Outcome(outcome)) => Ok(Resolution::Failed(outcome)),
            Err(LoadError::Lookup(e)) => Err(e),
        }
    }
}

#[derive(Debug)]
pub enum LoadError {
    Outcome(FailureOutcome),
    Lookup(UserLookupError),
}
