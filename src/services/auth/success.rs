/*
 * Responsibility
 * - Post-success callback run once a request is authenticated
 * - Default: do nothing, return control to the caller
 *
 * Notes
 * - Errors propagate out of the guard. Side effects already committed by
 *   `authenticated` listeners are not rolled back.
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::services::auth::request::InboundRequest;
use crate::services::auth::token::AuthenticatedToken;

#[derive(Debug, Error)]
#[error("post-authentication callback failed: {message}")]
pub struct SuccessHandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SuccessHandlerError {
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

#[async_trait]
pub trait SuccessHandler: Send + Sync {
    async fn on_success(
        &self,
        request: &dyn InboundRequest,
        token: &AuthenticatedToken,
    ) -> Result<(), SuccessHandlerError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSuccessHandler;

#[async_trait]
impl SuccessHandler for NoopSuccessHandler {
    async fn on_success(
        &self,
        _request: &dyn InboundRequest,
        _token: &AuthenticatedToken,
    ) -> Result<(), SuccessHandlerError> {
        Ok(())
    }
}
