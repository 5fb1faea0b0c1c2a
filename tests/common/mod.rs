//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use bearer_guard::services::auth::{
    AuthEventListener, AuthenticatedEvent, AuthenticatedToken, ChainTokenExtractor,
    ClaimsPayload, FailureEvent, FailureEventKind, FailureOutcome, IdentityResolver,
    InMemoryUserProvider, JwtClaimsDecoder, ListenerError, Principal, TokenGuard, parse_rules,
};
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};

pub const SECRET: &[u8] = b"integration-test-secret";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// HS256 token over `claims`, signed with [`SECRET`].
pub fn mint(claims: &Value) -> String {
    mint_with(claims, SECRET)
}

pub fn mint_with(claims: &Value, secret: &[u8]) -> String {
    jsonwebtoken::encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .unwrap()
}

/// Valid for one hour, `username` claim set to `identity`.
pub fn token_for(identity: &str) -> String {
    mint(&json!({"username": identity, "exp": now() + 3600}))
}

pub fn users() -> InMemoryUserProvider {
    InMemoryUserProvider::default()
        .with_user(Principal::new("alice", ["ROLE_USER"]))
        .with_user(Principal::new("bob", ["ROLE_USER", "ROLE_ADMIN"]))
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    NotFound(FailureOutcome),
    Invalid(FailureOutcome),
    Authenticated {
        claims: ClaimsPayload,
        token: AuthenticatedToken,
    },
}

/// Listener that remembers every event it sees, in order.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<Recorded>>,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, kind: FailureEventKind) -> usize {
        self.events()
            .iter()
            .filter(|e| match (e, kind) {
                (Recorded::NotFound(_), FailureEventKind::NotFound) => true,
                (Recorded::Invalid(_), FailureEventKind::Invalid) => true,
                _ => false,
            })
            .count()
    }

    pub fn authenticated(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, Recorded::Authenticated { .. }))
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl AuthEventListener for RecordingListener {
    fn on_authenticated(&self, event: &AuthenticatedEvent<'_>) -> Result<(), ListenerError> {
        self.events.lock().unwrap().push(Recorded::Authenticated {
            claims: event.claims().clone(),
            token: event.token().clone(),
        });
        Ok(())
    }

    fn on_invalid(&self, event: &mut FailureEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push(Recorded::Invalid(event.outcome().clone()));
    }

    fn on_not_found(&self, event: &mut FailureEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push(Recorded::NotFound(event.outcome().clone()));
    }
}

/// Guard over the real HS256 decoder and the fixture users.
pub fn guard_with_rules(rules: &str) -> (TokenGuard, Arc<RecordingListener>) {
    let extractor = ChainTokenExtractor::from_rules(parse_rules(rules).unwrap());
    let recorder = Arc::new(RecordingListener::default());
    let guard = TokenGuard::new(
        Arc::new(extractor),
        Arc::new(JwtClaimsDecoder::hs256(SECRET)),
        IdentityResolver::new("username", Arc::new(users())),
    )
    .with_listener(recorder.clone());
    (guard, recorder)
}

pub fn default_guard() -> (TokenGuard, Arc<RecordingListener>) {
    guard_with_rules("header:Authorization:Bearer")
}
