/*
 * Responsibility
 * - 環境変数の読み込み (PORT, APP_ENV, JWT_*, AUTH_USERS)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - 起動後は不変。AppState 経由で Arc 共有する
 */
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::services::auth::{
    DEFAULT_IDENTITY_CLAIM_KEY, ExtractionRule, InMemoryUserProvider, JwtKey, JwtValidationOptions,
    parse_rules,
};

pub const DEFAULT_TOKEN_EXTRACTORS: &str = "header:Authorization:Bearer";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    /// Claim that names the principal (`identityClaimKey`).
    pub identity_claim_key: String,
    /// Extraction order, first match wins.
    pub token_extractors: Vec<ExtractionRule>,

    pub jwt_algorithm: Algorithm,
    pub jwt_key: JwtKey,
    pub jwt_validation: JwtValidationOptions,

    pub users: InMemoryUserProvider,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(get("APP_ENV"));

        let identity_claim_key = get("JWT_IDENTITY_CLAIM")
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_IDENTITY_CLAIM_KEY.to_string());
        if identity_claim_key.is_empty() {
            return Err(ConfigError::Invalid("JWT_IDENTITY_CLAIM"));
        }

        let token_extractors = parse_extractors(
            get("JWT_TOKEN_EXTRACTORS")
                .as_deref()
                .unwrap_or(DEFAULT_TOKEN_EXTRACTORS),
        )?;

        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(raw) => {
                Algorithm::from_str(raw.trim()).map_err(|_| ConfigError::Invalid("JWT_ALGORITHM"))?
            }
            None => Algorithm::HS256,
        };

        let jwt_key = match jwt_algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
                if secret.is_empty() {
                    return Err(ConfigError::Invalid("JWT_SECRET"));
                }
                JwtKey::Secret(secret.into_bytes())
            }
            _ => JwtKey::PublicPem(
                get("JWT_PUBLIC_KEY_PEM")
                    .ok_or(ConfigError::Missing("JWT_PUBLIC_KEY_PEM"))?
                    .replace("\\n", "\n"),
            ),
        };

        let jwt_leeway_seconds = match get("JWT_LEEWAY_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid("JWT_LEEWAY_SECONDS"))?,
            None => 0,
        };

        let jwt_validation = JwtValidationOptions {
            issuer: get("JWT_ISSUER").filter(|s| !s.is_empty()),
            audience: get("JWT_AUDIENCE").filter(|s| !s.is_empty()),
            leeway_seconds: jwt_leeway_seconds,
        };

        let users = InMemoryUserProvider::parse(&get("AUTH_USERS").unwrap_or_default())
            .map_err(|_| ConfigError::Invalid("AUTH_USERS"))?;

        Ok(Self {
            addr,
            app_env,
            identity_claim_key,
            token_extractors,
            jwt_algorithm,
            jwt_key,
            jwt_validation,
            users,
        })
    }
}

fn parse_extractors(raw: &str) -> Result<Vec<ExtractionRule>, ConfigError> {
    parse_rules(raw).map_err(|_| ConfigError::Invalid("JWT_TOKEN_EXTRACTORS"))
}
