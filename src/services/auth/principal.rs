/*
 * Responsibility
 * - Principal: the user the identity claim resolves to (identity + roles)
 * - UserProvider: the user-lookup capability (async, external)
 * - InMemoryUserProvider: static table for config-driven deployments and tests
 */
use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    identity: String,
    roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, R>(identity: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            identity: identity.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserLookupError {
    #[error("no user for the given identity")]
    NotFound,
    /// The backing store could not answer. Not an authentication outcome.
    #[error("user lookup unavailable: {0}")]
    Unavailable(String),
}

/// Loads the principal for an identity string.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn load_principal(&self, identity: &str) -> Result<Principal, UserLookupError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserProvider {
    users: HashMap<String, Principal>,
}

impl InMemoryUserProvider {
    pub fn new(principals: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            users: principals
                .into_iter()
                .map(|p| (p.identity.clone(), p))
                .collect(),
        }
    }

    #[must_use]
    pub fn with_user(mut self, principal: Principal) -> Self {
        self.users.insert(principal.identity.clone(), principal);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Parse `alice=ROLE_USER|ROLE_ADMIN;bob=ROLE_USER`.
    ///
    /// A user with no roles is written `carol=`.
    pub fn parse(raw: &str) -> Result<Self, UserTableError> {
        let mut provider = Self::default();

        for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let (name, roles) = entry
                .split_once('=')
                .ok_or_else(|| UserTableError(entry.to_string()))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(UserTableError(entry.to_string()));
            }
            let roles = roles
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty());
            provider = provider.with_user(Principal::new(name, roles));
        }

        Ok(provider)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid user table entry: {0:?}")]
pub struct UserTableError(pub String);

#[async_trait]
impl UserProvider for InMemoryUserProvider {
    async fn load_principal(&self, identity: &str) -> Result<Principal, UserLookupError> {
        self.users
            .get(identity)
            .cloned()
            .ok_or(UserLookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_lookup() {
        let provider =
            InMemoryUserProvider::default().with_user(Principal::new("alice", ["ROLE_USER"]));

        let alice = provider.load_principal("alice").await.unwrap();
        assert_eq!(alice.identity(), "alice");
        assert!(alice.roles().contains("ROLE_USER"));

        assert_eq!(
            provider.load_principal("ghost").await,
            Err(UserLookupError::NotFound)
        );
    }

    #[test]
    fn parse_user_table() {
        let provider =
            InMemoryUserProvider::parse("alice=ROLE_USER|ROLE_ADMIN; bob=ROLE_USER ;carol=").unwrap();
        assert_eq!(provider.len(), 3);
        assert_eq!(provider.users["alice"].roles().len(), 2);
        assert!(provider.users["carol"].roles().is_empty());
    }

    #[test]
    fn parse_rejects_entries_without_separator() {
        assert!(InMemoryUserProvider::parse("alice").is_err());
        assert!(InMemoryUserProvider::parse("=ROLE_USER").is_err());
        assert!(InMemoryUserProvider::parse("").unwrap().is_empty());
    }
}
