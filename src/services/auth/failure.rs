/*
 * Responsibility
 * - The four handled ways an authentication attempt can fail (sum type)
 * - Mapping of each outcome to its lifecycle event kind and default message
 * - FailureResponse: the default 401 body `{"code":401,"message":"..."}`
 *
 * Notes
 * - Messages never carry the identity or the configured claim key; those go to logs.
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::auth::decoder::DecodeError;

pub const TOKEN_NOT_FOUND_MESSAGE: &str = "JWT Token not found";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid JWT Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureOutcome {
    AbsentCredential,
    /// `None` when the decoder produced nothing without reporting an error.
    DecodeFailure(Option<DecodeError>),
    IdentityMissingInPayload {
        identity_claim_key: String,
    },
    UnresolvableIdentity {
        identity: String,
        identity_claim_key: String,
    },
}

/// Which lifecycle notification a failure produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureEventKind {
    NotFound,
    Invalid,
}

impl fmt::Display for FailureEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not-found"),
            Self::Invalid => write!(f, "invalid"),
        }
    }
}

impl FailureOutcome {
    pub fn event_kind(&self) -> FailureEventKind {
        match self {
            Self::AbsentCredential => FailureEventKind::NotFound,
            Self::DecodeFailure(_)
            | Self::IdentityMissingInPayload { .. }
            | Self::UnresolvableIdentity { .. } => FailureEventKind::Invalid,
        }
    }

    /// Client-facing message.
    pub fn message(&self) -> String {
        match self {
            Self::AbsentCredential => TOKEN_NOT_FOUND_MESSAGE.to_string(),
            Self::DecodeFailure(Some(cause)) => {
                format!("{INVALID_TOKEN_MESSAGE}: {}", cause.reason())
            }
            Self::DecodeFailure(None)
            | Self::IdentityMissingInPayload { .. }
            | Self::UnresolvableIdentity { .. } => INVALID_TOKEN_MESSAGE.to_string(),
        }
    }

    /// Short machine label, for logs and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AbsentCredential => "absent_credential",
            Self::DecodeFailure(_) => "decode_failure",
            Self::IdentityMissingInPayload { .. } => "identity_missing_in_payload",
            Self::UnresolvableIdentity { .. } => "unresolvable_identity",
        }
    }

    pub fn decode_cause(&self) -> Option<&DecodeError> {
        match self {
            Self::DecodeFailure(cause) => cause.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for FailureOutcome {
    /// Log form; may include the identity and claim key.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AbsentCredential => write!(f, "no credential found"),
            Self::DecodeFailure(Some(cause)) => write!(f, "decode failure: {cause}"),
            Self::DecodeFailure(None) => write!(f, "decode failure: no claims"),
            Self::IdentityMissingInPayload { identity_claim_key } => write!(
                f,
                "unable to find a key corresponding to the configured identity claim ({identity_claim_key:?}) in the token payload"
            ),
            Self::UnresolvableIdentity {
                identity,
                identity_claim_key,
            } => write!(
                f,
                "unable to load a user with {identity_claim_key:?} = {identity:?}"
            ),
        }
    }
}

/// Default failure response built by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureResponse {
    #[serde(rename = "code", serialize_with = "serialize_status")]
    status: StatusCode,
    message: String,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn from_outcome(outcome: &FailureOutcome) -> Self {
        Self::new(outcome.message())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl IntoResponse for FailureResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut res = (status, Json(self)).into_response();
        res.headers_mut()
            .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        res
    }
}

/// What the guard hands back on failure: its own default, or whatever an
/// event listener put in the response slot (returned verbatim).
pub enum FailureReply {
    Default(FailureResponse),
    Overridden(Response),
}

impl FailureReply {
    pub fn is_overridden(&self) -> bool {
        matches!(self, Self::Overridden(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Default(res) => res.status(),
            Self::Overridden(res) => res.status(),
        }
    }

    pub fn default_response(&self) -> Option<&FailureResponse> {
        match self {
            Self::Default(res) => Some(res),
            Self::Overridden(_) => None,
        }
    }
}

impl fmt::Debug for FailureReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default(res) => f.debug_tuple("Default").field(res).finish(),
            Self::Overridden(res) => f
                .debug_struct("Overridden")
                .field("status", &res.status())
                .finish_non_exhaustive(),
        }
    }
}

impl IntoResponse for FailureReply {
    fn into_response(self) -> Response {
        match self {
            Self::Default(res) => res.into_response(),
            Self::Overridden(res) => res,
        }
    }
}
