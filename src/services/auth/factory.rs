/// Factory: build the `TokenGuard` from application `Config`.
use std::sync::Arc;

use thiserror::Error;

use crate::config::Config;
use crate::services::auth::{
    AuditLogListener, ChainTokenExtractor, IdentityResolver, JwtClaimsDecoder, JwtDecoderError,
    TokenGuard,
};

#[derive(Debug, Error)]
pub enum GuardBuildError {
    #[error("jwt decoder: {0}")]
    Decoder(#[from] JwtDecoderError),
}

pub fn build_token_guard(config: &Config) -> Result<Arc<TokenGuard>, GuardBuildError> {
    let extractor = ChainTokenExtractor::from_rules(config.token_extractors.iter().cloned());

    let decoder = JwtClaimsDecoder::new(
        config.jwt_algorithm,
        &config.jwt_key,
        &config.jwt_validation,
    )?;

    let resolver = IdentityResolver::new(
        config.identity_claim_key.clone(),
        Arc::new(config.users.clone()),
    );

    let guard = TokenGuard::new(Arc::new(extractor), Arc::new(decoder), resolver)
        .with_listener(Arc::new(AuditLogListener));

    Ok(Arc::new(guard))
}
