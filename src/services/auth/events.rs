//! Lifecycle notifications.
//!
//! Three kinds of events are published by the guard:
//!
//! - **authenticated**: a principal was resolved. Listeners see the verified
//!   claims and the token; they cannot veto, but an `Err` aborts the request.
//! - **invalid**: decode failure, identity missing in payload, unresolvable
//!   identity.
//! - **not-found**: no credential in any configured location.
//!
//! Failure events carry a mutable response slot. A listener that fills it
//! replaces the guard's default response; the guard checks the slot after
//! every failure dispatch.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::services::auth::claims::ClaimsPayload;
use crate::services::auth::failure::{FailureEventKind, FailureOutcome, FailureResponse};
use crate::services::auth::request::InboundRequest;
use crate::services::auth::token::AuthenticatedToken;

#[derive(Debug)]
pub struct AuthenticatedEvent<'a> {
    claims: &'a ClaimsPayload,
    token: &'a AuthenticatedToken,
    authenticated_at: DateTime<Utc>,
}

impl<'a> AuthenticatedEvent<'a> {
    pub fn new(claims: &'a ClaimsPayload, token: &'a AuthenticatedToken) -> Self {
        Self {
            claims,
            token,
            authenticated_at: Utc::now(),
        }
    }

    pub fn claims(&self) -> &ClaimsPayload {
        self.claims
    }

    pub fn token(&self) -> &AuthenticatedToken {
        self.token
    }

    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }
}

pub struct FailureEvent<'a> {
    request: &'a dyn InboundRequest,
    outcome: &'a FailureOutcome,
    default_response: &'a FailureResponse,
    response: Option<Response>,
}

impl<'a> FailureEvent<'a> {
    pub fn new(
        request: &'a dyn InboundRequest,
        outcome: &'a FailureOutcome,
        default_response: &'a FailureResponse,
    ) -> Self {
        Self {
            request,
            outcome,
            default_response,
            response: None,
        }
    }

    pub fn kind(&self) -> FailureEventKind {
        self.outcome.event_kind()
    }

    pub fn request(&self) -> &dyn InboundRequest {
        self.request
    }

    pub fn outcome(&self) -> &FailureOutcome {
        self.outcome
    }

    /// The response the guard will send if nobody fills the slot.
    pub fn default_response(&self) -> &FailureResponse {
        self.default_response
    }

    pub fn set_response(&mut self, response: impl IntoResponse) {
        self.response = Some(response.into_response());
    }

    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }
}

impl std::fmt::Debug for FailureEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureEvent")
            .field("path", &self.request.path())
            .field("outcome", self.outcome)
            .field("default_response", self.default_response)
            .field("has_response", &self.response.is_some())
            .finish()
    }
}

/// Raised by an `authenticated` listener to abort the request.
#[derive(Debug, Error)]
#[error("event listener aborted authentication: {message}")]
pub struct ListenerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Observer of guard lifecycle events. Every method defaults to a no-op.
pub trait AuthEventListener: Send + Sync {
    fn on_authenticated(&self, _event: &AuthenticatedEvent<'_>) -> Result<(), ListenerError> {
        Ok(())
    }

    fn on_invalid(&self, _event: &mut FailureEvent<'_>) {}

    fn on_not_found(&self, _event: &mut FailureEvent<'_>) {}
}

/// Synchronous publish/subscribe over registered listeners, in registration order.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    listeners: Vec<Arc<dyn AuthEventListener>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn AuthEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn subscribe(&mut self, listener: Arc<dyn AuthEventListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Stops at the first listener error and returns it.
    pub fn dispatch_authenticated(
        &self,
        event: &AuthenticatedEvent<'_>,
    ) -> Result<(), ListenerError> {
        for listener in &self.listeners {
            listener.on_authenticated(event)?;
        }
        Ok(())
    }

    /// One event, delivered to every listener under its kind.
    pub fn dispatch_failure(&self, event: &mut FailureEvent<'_>) {
        let kind = event.kind();
        for listener in &self.listeners {
            match kind {
                FailureEventKind::NotFound => listener.on_not_found(event),
                FailureEventKind::Invalid => listener.on_invalid(event),
            }
        }
    }
}

/// Records every lifecycle event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AuditLogListener;

impl AuthEventListener for AuditLogListener {
    fn on_authenticated(&self, event: &AuthenticatedEvent<'_>) -> Result<(), ListenerError> {
        info!(
            identity = %event.token().identity(),
            roles = ?event.token().authorization_attributes(),
            claims = event.claims().len(),
            at = %event.authenticated_at(),
            "authenticated"
        );
        Ok(())
    }

    fn on_invalid(&self, event: &mut FailureEvent<'_>) {
        warn!(
            path = %event.request().path(),
            outcome = event.outcome().code(),
            "invalid token"
        );
    }

    fn on_not_found(&self, event: &mut FailureEvent<'_>) {
        info!(path = %event.request().path(), "token not found");
    }
}
