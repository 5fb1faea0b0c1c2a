pub mod claims;
pub mod decoder;
pub mod events;
pub mod extractor;
pub mod factory;
pub mod failure;
pub mod guard;
pub mod identity;
pub mod jwt;
pub mod principal;
pub mod request;
pub mod success;
pub mod token;

pub use claims::ClaimsPayload;
pub use decoder::{ClaimsDecoder, DecodeError};
pub use events::{
    AuditLogListener, AuthEventListener, AuthenticatedEvent, EventDispatcher, FailureEvent,
    ListenerError,
};
pub use extractor::{
    AuthorizationHeaderTokenExtractor, ChainTokenExtractor, CookieTokenExtractor, ExtractionRule,
    ExtractionRuleError, QueryParameterTokenExtractor, TokenExtractor, parse_rules,
};
pub use factory::{GuardBuildError, build_token_guard};
pub use failure::{
    FailureEventKind, FailureOutcome, FailureReply, FailureResponse, INVALID_TOKEN_MESSAGE,
    TOKEN_NOT_FOUND_MESSAGE,
};
pub use guard::{AuthFailure, GuardError, GuardOutcome, TokenGuard};
pub use identity::{DEFAULT_IDENTITY_CLAIM_KEY, IdentityResolver, Resolution};
pub use jwt::{JwtClaimsDecoder, JwtDecoderError, JwtKey, JwtValidationOptions};
pub use principal::{InMemoryUserProvider, Principal, UserLookupError, UserProvider, UserTableError};
pub use request::{InboundRequest, TestRequest};
pub use success::{NoopSuccessHandler, SuccessHandler, SuccessHandlerError};
pub use token::{AuthenticatedToken, PreAuthToken};
