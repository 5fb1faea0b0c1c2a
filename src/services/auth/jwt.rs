/*
 * Responsibility
 * - jsonwebtoken による ClaimsDecoder 実装 (HS / RS / PS / ES / EdDSA)
 * - iss / aud / leeway の検証設定
 * - jsonwebtoken の ErrorKind を DecodeError に変換
 */
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::services::auth::claims::ClaimsPayload;
use crate::services::auth::decoder::{ClaimsDecoder, DecodeError};

/// Key material for verification.
#[derive(Clone)]
pub enum JwtKey {
    /// Shared secret for the HS* family.
    Secret(Vec<u8>),
    /// PEM public key for RS*/PS*, ES* and EdDSA.
    PublicPem(String),
}

impl fmt::Debug for JwtKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        match self {
            Self::Secret(_) => f.write_str("JwtKey::Secret(..)"),
            Self::PublicPem(_) => f.write_str("JwtKey::PublicPem(..)"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtDecoderError {
    #[error("algorithm {0:?} needs a PEM public key, got a secret")]
    ExpectedPublicKey(Algorithm),
    #[error("algorithm {0:?} needs a shared secret, got a PEM key")]
    ExpectedSecret(Algorithm),
    #[error("invalid key: {0}")]
    InvalidKey(#[from] jsonwebtoken::errors::Error),
}

/// Verification settings besides the key.
#[derive(Debug, Clone, Default)]
pub struct JwtValidationOptions {
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: u64,
}

/// `ClaimsDecoder` backed by `jsonwebtoken`.
///
/// - `exp` is always required and checked; `nbf` is checked when present.
/// - `iss` / `aud` are checked only when configured.
#[derive(Clone)]
pub struct JwtClaimsDecoder {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for JwtClaimsDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("JwtClaimsDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtClaimsDecoder {
    pub fn new(
        algorithm: Algorithm,
        key: &JwtKey,
        options: &JwtValidationOptions,
    ) -> Result<Self, JwtDecoderError> {
        let decoding_key = match (algorithm, key) {
            (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, JwtKey::Secret(secret)) => {
                DecodingKey::from_secret(secret)
            }
            (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512, JwtKey::PublicPem(_)) => {
                return Err(JwtDecoderError::ExpectedSecret(algorithm));
            }
            (_, JwtKey::Secret(_)) => return Err(JwtDecoderError::ExpectedPublicKey(algorithm)),
            (
                Algorithm::RS256
                | Algorithm::RS384
                | Algorithm::RS512
                | Algorithm::PS256
                | Algorithm::PS384
                | Algorithm::PS512,
                JwtKey::PublicPem(pem),
            ) => DecodingKey::from_rsa_pem(pem.as_bytes())?,
            (Algorithm::ES256 | Algorithm::ES384, JwtKey::PublicPem(pem)) => {
                DecodingKey::from_ec_pem(pem.as_bytes())?
            }
            (Algorithm::EdDSA, JwtKey::PublicPem(pem)) => DecodingKey::from_ed_pem(pem.as_bytes())?,
        };

        let mut validation = Validation::new(algorithm);
        validation.leeway = options.leeway_seconds;
        validation.validate_nbf = true;
        match &options.audience {
            Some(aud) => validation.set_audience(&[aud]),
            // Without a configured audience any `aud` claim is accepted.
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &options.issuer {
            validation.set_issuer(&[iss]);
        }

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    /// HS256 decoder with default options.
    pub fn hs256(secret: impl Into<Vec<u8>>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(&secret.into()),
            validation,
        }
    }

    fn verify(&self, token: &str) -> Result<Map<String, Value>, jsonwebtoken::errors::Error> {
        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )?;
        Ok(data.claims)
    }
}

#[async_trait]
impl ClaimsDecoder for JwtClaimsDecoder {
    async fn decode(&self, raw_credential: &str) -> Result<Option<ClaimsPayload>, DecodeError> {
        match self.verify(raw_credential) {
            Ok(claims) => Ok(Some(ClaimsPayload::new(claims))),
            Err(e) => {
                debug!(error = %e, "jwt verification failed");
                Err(map_jwt_error(&e))
            }
        }
    }
}

fn map_jwt_error(e: &jsonwebtoken::errors::Error) -> DecodeError {
    match e.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => {
            DecodeError::Malformed(e.to_string())
        }
        ErrorKind::InvalidSignature => DecodeError::InvalidSignature,
        ErrorKind::ExpiredSignature => DecodeError::Expired,
        ErrorKind::ImmatureSignature => DecodeError::NotYetValid,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            DecodeError::UnsupportedAlgorithm
        }
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::MissingRequiredClaim(_) => DecodeError::InvalidClaims(e.to_string()),
        _ => DecodeError::Other(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"unit-test-secret";

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    fn sign(alg: Algorithm, claims: &Value) -> String {
        jsonwebtoken::encode(&Header::new(alg), claims, &EncodingKey::from_secret(SECRET)).unwrap()
    }

    #[tokio::test]
    async fn decodes_valid_token_in_order() {
        let decoder = JwtClaimsDecoder::hs256(SECRET);
        let token = sign(
            Algorithm::HS256,
            &json!({"username": "alice", "exp": now() + 60, "roles": ["ROLE_USER"]}),
        );

        let claims = decoder.decode(&token).await.unwrap().unwrap();
        assert_eq!(claims.get("username"), Some(&json!("alice")));
        assert_eq!(
            claims.keys().collect::<Vec<_>>(),
            vec!["username", "exp", "roles"]
        );
    }

    #[tokio::test]
    async fn expired_token() {
        let decoder = JwtClaimsDecoder::hs256(SECRET);
        let token = sign(Algorithm::HS256, &json!({"username": "a", "exp": now() - 600}));
        assert_eq!(decoder.decode(&token).await, Err(DecodeError::Expired));
    }

    #[tokio::test]
    async fn not_yet_valid_token() {
        let decoder = JwtClaimsDecoder::hs256(SECRET);
        let token = sign(
            Algorithm::HS256,
            &json!({"username": "a", "exp": now() + 6000, "nbf": now() + 3000}),
        );
        assert_eq!(decoder.decode(&token).await, Err(DecodeError::NotYetValid));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid_signature() {
        let decoder = JwtClaimsDecoder::hs256(b"another-secret".to_vec());
        let token = sign(Algorithm::HS256, &json!({"username": "a", "exp": now() + 60}));
        assert_eq!(decoder.decode(&token).await, Err(DecodeError::InvalidSignature));
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        let decoder = JwtClaimsDecoder::hs256(SECRET);
        let err = decoder.decode("badtoken").await.unwrap_err();
        assert_eq!(err.reason(), "malformed");
    }

    #[tokio::test]
    async fn algorithm_mismatch_is_unsupported() {
        let decoder = JwtClaimsDecoder::hs256(SECRET);
        let token = sign(Algorithm::HS512, &json!({"username": "a", "exp": now() + 60}));
        assert_eq!(
            decoder.decode(&token).await,
            Err(DecodeError::UnsupportedAlgorithm)
        );
    }

    #[tokio::test]
    async fn issuer_and_audience_are_enforced_when_configured() {
        let options = JwtValidationOptions {
            issuer: Some("https://issuer.example".into()),
            audience: Some("api".into()),
            leeway_seconds: 0,
        };
        let decoder =
            JwtClaimsDecoder::new(Algorithm::HS256, &JwtKey::Secret(SECRET.to_vec()), &options)
                .unwrap();

        let good = sign(
            Algorithm::HS256,
            &json!({"iss": "https://issuer.example", "aud": "api", "exp": now() + 60}),
        );
        assert!(decoder.decode(&good).await.unwrap().is_some());

        let bad = sign(
            Algorithm::HS256,
            &json!({"iss": "https://other.example", "aud": "api", "exp": now() + 60}),
        );
        assert_eq!(
            decoder.decode(&bad).await.unwrap_err().reason(),
            "invalid claims"
        );
    }

    #[test]
    fn key_kind_must_match_algorithm() {
        let options = JwtValidationOptions::default();
        assert!(matches!(
            JwtClaimsDecoder::new(Algorithm::RS256, &JwtKey::Secret(b"s".to_vec()), &options),
            Err(JwtDecoderError::ExpectedPublicKey(Algorithm::RS256))
        ));
        assert!(matches!(
            JwtClaimsDecoder::new(Algorithm::HS256, &JwtKey::PublicPem("pem".into()), &options),
            Err(JwtDecoderError::ExpectedSecret(Algorithm::HS256))
        ));
        assert!(matches!(
            JwtClaimsDecoder::new(
                Algorithm::EdDSA,
                &JwtKey::PublicPem("not a pem".into()),
                &options,
            ),
            Err(JwtDecoderError::InvalidKey(_))
        ));
    }
}
