/*
 * Responsibility
 * - One pass per request: extract -> decode -> resolve identity -> authenticated
 * - Every handled failure becomes exactly one failure event and a reply
 * - Post-success callback; its errors (and listener/user-store errors) escape as GuardError
 *
 * Notes
 * - Stages run strictly in order; each one awaits the previous result.
 * - The guard holds only immutable configuration and shared collaborators.
 */
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::services::auth::claims::ClaimsPayload;
use crate::services::auth::decoder::{ClaimsDecoder, DecodeError};
use crate::services::auth::events::{
    AuthEventListener, AuthenticatedEvent, EventDispatcher, FailureEvent, ListenerError,
};
use crate::services::auth::extractor::TokenExtractor;
use crate::services::auth::failure::{FailureOutcome, FailureReply, FailureResponse};
use crate::services::auth::identity::{IdentityResolver, Resolution};
use crate::services::auth::principal::UserLookupError;
use crate::services::auth::request::InboundRequest;
use crate::services::auth::success::{NoopSuccessHandler, SuccessHandler, SuccessHandlerError};
use crate::services::auth::token::{AuthenticatedToken, PreAuthToken};

/// Faults the guard does not turn into a failure reply.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    SuccessHandler(#[from] SuccessHandlerError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    UserLookup(#[from] UserLookupError),
}

#[derive(Debug)]
pub struct AuthFailure {
    outcome: FailureOutcome,
    reply: FailureReply,
}

impl AuthFailure {
    pub fn outcome(&self) -> &FailureOutcome {
        &self.outcome
    }

    pub fn reply(&self) -> &FailureReply {
        &self.reply
    }

    pub fn into_reply(self) -> FailureReply {
        self.reply
    }
}

impl IntoResponse for AuthFailure {
    fn into_response(self) -> Response {
        self.reply.into_response()
    }
}

#[derive(Debug)]
pub enum GuardOutcome {
    /// No response is produced; the caller continues with the request.
    Authenticated(AuthenticatedToken),
    Failed(AuthFailure),
}

impl GuardOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn token(&self) -> Option<&AuthenticatedToken> {
        match self {
            Self::Authenticated(token) => Some(token),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&AuthFailure> {
        match self {
            Self::Authenticated(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

pub struct TokenGuard {
    extractor: Arc<dyn TokenExtractor>,
    decoder: Arc<dyn ClaimsDecoder>,
    resolver: IdentityResolver,
    events: EventDispatcher,
    success_handler: Arc<dyn SuccessHandler>,
}

impl std::fmt::Debug for TokenGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenGuard")
            .field("extractor", &self.extractor)
            .field("resolver", &self.resolver)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl TokenGuard {
    pub fn new(
        extractor: Arc<dyn TokenExtractor>,
        decoder: Arc<dyn ClaimsDecoder>,
        resolver: IdentityResolver,
    ) -> Self {
        Self {
            extractor,
            decoder,
            resolver,
            events: EventDispatcher::default(),
            success_handler: Arc::new(NoopSuccessHandler),
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn AuthEventListener>) -> Self {
        self.events.subscribe(listener);
        self
    }

    #[must_use]
    pub fn with_success_handler(mut self, handler: Arc<dyn SuccessHandler>) -> Self {
        self.success_handler = handler;
        self
    }

    pub fn identity_claim_key(&self) -> &str {
        self.resolver.identity_claim_key()
    }

    pub async fn authenticate(
        &self,
        request: &dyn InboundRequest,
    ) -> Result<GuardOutcome, GuardError> {
        // Extracting
        let Some(raw_credential) = self.extractor.extract(request) else {
            return Ok(self.fail(request, FailureOutcome::AbsentCredential));
        };
        let token = PreAuthToken::new(raw_credential);

        // Decoding
        let claims = match self.decode(token.raw_credential()).await {
            Ok(claims) => claims,
            Err(outcome) => return Ok(self.fail(request, outcome)),
        };
        let token = token.attach_claims(claims.clone());

        // ResolvingIdentity
        let authenticated = match self.resolver.resolve(&token).await {
            Ok(Resolution::Resolved(authenticated)) => authenticated,
            Ok(Resolution::Failed(outcome)) => return Ok(self.fail(request, outcome)),
            Err(err) => {
                error!(error = %err, path = %request.path(), "user lookup failed");
                return Err(err.into());
            }
        };

        // Authenticated
        self.events
            .dispatch_authenticated(&AuthenticatedEvent::new(&claims, &authenticated))
            .inspect_err(|err| warn!(error = %err, "authenticated listener aborted request"))?;

        self.success_handler
            .on_success(request, &authenticated)
            .await
            .inspect_err(|err| error!(error = %err, "post-authentication callback failed"))?;

        debug!(identity = %authenticated.identity(), "request authenticated");
        Ok(GuardOutcome::Authenticated(authenticated))
    }

    async fn decode(&self, raw_credential: &str) -> Result<ClaimsPayload, FailureOutcome> {
        match self.decoder.decode(raw_credential).await {
            Ok(Some(claims)) if !claims.is_empty() => Ok(claims),
            Ok(Some(_)) => Err(FailureOutcome::DecodeFailure(Some(DecodeError::EmptyPayload))),
            Ok(None) => Err(FailureOutcome::DecodeFailure(None)),
            Err(err) => Err(FailureOutcome::DecodeFailure(Some(err))),
        }
    }

    fn fail(&self, request: &dyn InboundRequest, outcome: FailureOutcome) -> GuardOutcome {
        log_failure(request, &outcome);

        let default_response = FailureResponse::from_outcome(&outcome);
        let overridden = {
            let mut event = FailureEvent::new(request, &outcome, &default_response);
            self.events.dispatch_failure(&mut event);
            event.take_response()
        };

        let reply = match overridden {
            Some(response) => FailureReply::Overridden(response),
            None => FailureReply::Default(default_response),
        };

        GuardOutcome::Failed(AuthFailure { outcome, reply })
    }
}

fn log_failure(request: &dyn InboundRequest, outcome: &FailureOutcome) {
    let path = request.path();
    match outcome {
        FailureOutcome::AbsentCredential => {
            debug!(%path, "no bearer credential in request");
        }
        FailureOutcome::DecodeFailure(cause) => {
            let reason = cause.as_ref().map_or("no claims", DecodeError::reason);
            warn!(%path, reason, detail = %outcome, "token decode failed");
        }
        FailureOutcome::IdentityMissingInPayload { identity_claim_key } => {
            // Verified token without the configured claim: issuer or config mismatch.
            error!(%path, %identity_claim_key, "identity claim missing from verified token");
        }
        FailureOutcome::UnresolvableIdentity {
            identity,
            identity_claim_key,
        } => {
            warn!(%path, %identity, %identity_claim_key, "no user for token identity");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::extractor::AuthorizationHeaderTokenExtractor;
    use crate::services::auth::failure::FailureEventKind;
    use crate::services::auth::principal::{InMemoryUserProvider, Principal, UserProvider};
    use crate::services::auth::request::TestRequest;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Decoder backed by a fixed table of credential -> result.
    struct TableDecoder(HashMap<&'static str, Result<Option<Value>, DecodeError>>);

    #[async_trait]
    impl ClaimsDecoder for TableDecoder {
        async fn decode(&self, raw: &str) -> Result<Option<ClaimsPayload>, DecodeError> {
            match self.0.get(raw) {
                Some(Ok(Some(v))) => Ok(Some(ClaimsPayload::try_from(v.clone()).unwrap())),
                Some(Ok(None)) => Ok(None),
                Some(Err(e)) => Err(e.clone()),
                None => Err(DecodeError::InvalidSignature),
            }
        }
    }

    struct DownStore;

    #[async_trait]
    impl UserProvider for DownStore {
        async fn load_principal(&self, _: &str) -> Result<Principal, UserLookupError> {
            Err(UserLookupError::Unavailable("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct Recorder {
        failures: Mutex<Vec<(FailureEventKind, FailureOutcome)>>,
        authenticated: Mutex<Vec<(ClaimsPayload, AuthenticatedToken)>>,
    }

    impl AuthEventListener for Recorder {
        fn on_authenticated(&self, event: &AuthenticatedEvent<'_>) -> Result<(), ListenerError> {
            self.authenticated
                .lock()
                .unwrap()
                .push((event.claims().clone(), event.token().clone()));
            Ok(())
        }

        fn on_invalid(&self, event: &mut FailureEvent<'_>) {
            self.failures
                .lock()
                .unwrap()
                .push((event.kind(), event.outcome().clone()));
        }

        fn on_not_found(&self, event: &mut FailureEvent<'_>) {
            self.failures
                .lock()
                .unwrap()
                .push((event.kind(), event.outcome().clone()));
        }
    }

    struct FailingCallback;

    #[async_trait]
    impl SuccessHandler for FailingCallback {
        async fn on_success(
            &self,
            _: &dyn InboundRequest,
            _: &AuthenticatedToken,
        ) -> Result<(), SuccessHandlerError> {
            Err(SuccessHandlerError::new("session store down"))
        }
    }

    fn decoder() -> Arc<dyn ClaimsDecoder> {
        Arc::new(TableDecoder(HashMap::from([
            ("good", Ok(Some(json!({"username": "alice"})))),
            ("ghost", Ok(Some(json!({"username": "ghost"})))),
            ("sub-only", Ok(Some(json!({"sub": "alice", "exp": 1})))),
            ("empty", Ok(Some(json!({})))),
            ("nothing", Ok(None)),
            ("expired", Err(DecodeError::Expired)),
        ])))
    }

    fn guard_with(users: Arc<dyn UserProvider>) -> (TokenGuard, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let guard = TokenGuard::new(
            Arc::new(AuthorizationHeaderTokenExtractor::bearer()),
            decoder(),
            IdentityResolver::new("username", users),
        )
        .with_listener(recorder.clone());
        (guard, recorder)
    }

    fn guard() -> (TokenGuard, Arc<Recorder>) {
        guard_with(Arc::new(
            InMemoryUserProvider::default().with_user(Principal::new("alice", ["ROLE_USER"])),
        ))
    }

    fn bearer(token: &str) -> TestRequest {
        TestRequest::new("/api").with_header("Authorization", format!("Bearer {token}"))
    }

    fn failed(outcome: GuardOutcome) -> AuthFailure {
        match outcome {
            GuardOutcome::Failed(failure) => failure,
            GuardOutcome::Authenticated(token) => panic!("unexpected success: {token:?}"),
        }
    }

    #[tokio::test]
    async fn absent_credential_fires_one_not_found() {
        let (guard, recorder) = guard();
        let failure = failed(guard.authenticate(&TestRequest::new("/api")).await.unwrap());

        assert_eq!(failure.outcome(), &FailureOutcome::AbsentCredential);
        let failures = recorder.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, FailureEventKind::NotFound);
        assert_eq!(
            failure.reply().default_response().unwrap().message(),
            "JWT Token not found"
        );
    }

    #[tokio::test]
    async fn decode_failure_and_empty_results_are_invalid() {
        let (guard, recorder) = guard();
        for raw in ["expired", "nothing", "empty", "unknown"] {
            let failure = failed(guard.authenticate(&bearer(raw)).await.unwrap());
            assert!(matches!(failure.outcome(), FailureOutcome::DecodeFailure(_)));
        }

        let failures = recorder.failures.lock().unwrap();
        assert_eq!(failures.len(), 4);
        assert!(failures.iter().all(|(k, _)| *k == FailureEventKind::Invalid));
    }

    #[tokio::test]
    async fn success_dispatches_authenticated_with_claims() {
        let (guard, recorder) = guard();
        let outcome = guard.authenticate(&bearer("good")).await.unwrap();

        let token = outcome.token().unwrap();
        assert_eq!(token.identity(), "alice");
        assert_eq!(token.raw_credential(), "good");

        let seen = recorder.authenticated.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.get("username"), Some(&json!("alice")));
        assert!(recorder.failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn listener_override_is_returned_verbatim() {
        struct Teapot;
        impl AuthEventListener for Teapot {
            fn on_invalid(&self, event: &mut FailureEvent<'_>) {
                event.set_response(StatusCode::IM_A_TEAPOT);
            }
        }

        let (guard, _) = guard();
        let guard = guard.with_listener(Arc::new(Teapot));

        let failure = failed(guard.authenticate(&bearer("ghost")).await.unwrap());
        assert!(failure.reply().is_overridden());
        assert_eq!(failure.into_response().status(), StatusCode::IM_A_TEAPOT);

        // Not-found path is untouched by this listener.
        let failure = failed(guard.authenticate(&TestRequest::new("/")).await.unwrap());
        assert!(!failure.reply().is_overridden());
    }

    #[tokio::test]
    async fn success_callback_error_propagates() {
        let (guard, recorder) = guard();
        let guard = guard.with_success_handler(Arc::new(FailingCallback));

        let err = guard.authenticate(&bearer("good")).await.unwrap_err();
        assert!(matches!(err, GuardError::SuccessHandler(_)));
        // Listener side effects stay committed.
        assert_eq!(recorder.authenticated.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn authenticated_listener_error_aborts_before_callback() {
        struct Locked;
        impl AuthEventListener for Locked {
            fn on_authenticated(&self, _: &AuthenticatedEvent<'_>) -> Result<(), ListenerError> {
                Err(ListenerError::new("locked"))
            }
        }

        let (guard, recorder) = guard();
        let guard = guard
            .with_listener(Arc::new(Locked))
            .with_success_handler(Arc::new(FailingCallback));

        let err = guard.authenticate(&bearer("good")).await.unwrap_err();
        assert!(matches!(&err, GuardError::Listener(e) if e.message() == "locked"));
        // Earlier listeners already ran; no failure event is emitted.
        assert_eq!(recorder.authenticated.lock().unwrap().len(), 1);
        assert!(recorder.failures.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_store_outage_is_not_an_auth_failure() {
        let (guard, recorder) = guard_with(Arc::new(DownStore));

        let err = guard.authenticate(&bearer("good")).await.unwrap_err();
        assert!(matches!(
            err,
            GuardError::UserLookup(UserLookupError::Unavailable(_))
        ));
        assert!(recorder.failures.lock().unwrap().is_empty());
    }
}
