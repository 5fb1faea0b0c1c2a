/*
 * Responsibility
 * - Pull the raw bearer credential out of a request (header / query / cookie)
 * - No decoding, no side effects: `None` is the normal "no credential" case
 * - `ChainTokenExtractor` applies the configured extraction order
 */
use std::fmt;

use crate::services::auth::request::InboundRequest;

/// Pulls a raw credential out of an inbound request.
///
/// Returning `None` is not an error: it is the unauthenticated case and the
/// guard turns it into the "not found" path.
pub trait TokenExtractor: Send + Sync + fmt::Debug {
    fn extract(&self, request: &dyn InboundRequest) -> Option<String>;
}

/// `Authorization: Bearer <token>` style extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationHeaderTokenExtractor {
    name: String,
    prefix: Option<String>,
}

impl AuthorizationHeaderTokenExtractor {
    /// `prefix` of `None` (or an empty prefix) takes the whole header value.
    pub fn new(name: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            name: name.into(),
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    pub fn bearer() -> Self {
        Self::new("Authorization", Some("Bearer".to_string()))
    }
}

impl TokenExtractor for AuthorizationHeaderTokenExtractor {
    fn extract(&self, request: &dyn InboundRequest) -> Option<String> {
        let value = request.header(&self.name)?;

        let token = match &self.prefix {
            None => value,
            Some(prefix) => {
                // "<prefix> <token>", prefix compared case-insensitively.
                let (scheme, rest) = value.split_once(' ')?;
                if !scheme.eq_ignore_ascii_case(prefix) {
                    return None;
                }
                rest
            }
        };

        non_empty(token.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParameterTokenExtractor {
    name: String,
}

impl QueryParameterTokenExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor for QueryParameterTokenExtractor {
    fn extract(&self, request: &dyn InboundRequest) -> Option<String> {
        non_empty(&request.query_param(&self.name)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieTokenExtractor {
    name: String,
}

impl CookieTokenExtractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TokenExtractor for CookieTokenExtractor {
    fn extract(&self, request: &dyn InboundRequest) -> Option<String> {
        non_empty(&request.cookie(&self.name)?)
    }
}

/// Tries each extractor in order; the first non-empty value wins.
#[derive(Debug, Default)]
pub struct ChainTokenExtractor {
    extractors: Vec<Box<dyn TokenExtractor>>,
}

impl ChainTokenExtractor {
    pub fn new(extractors: Vec<Box<dyn TokenExtractor>>) -> Self {
        Self { extractors }
    }

    /// Chain in rule order.
    pub fn from_rules(rules: impl IntoIterator<Item = ExtractionRule>) -> Self {
        Self::new(rules.into_iter().map(ExtractionRule::into_extractor).collect())
    }

    #[must_use]
    pub fn with(mut self, extractor: impl TokenExtractor + 'static) -> Self {
        self.extractors.push(Box::new(extractor));
        self
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl TokenExtractor for ChainTokenExtractor {
    fn extract(&self, request: &dyn InboundRequest) -> Option<String> {
        self.extractors.iter().find_map(|e| e.extract(request))
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// One configured extraction location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRule {
    Header { name: String, prefix: Option<String> },
    Query { name: String },
    Cookie { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid extraction rule: {0:?}")]
pub struct ExtractionRuleError(pub String);

impl ExtractionRule {
    /// Parse `header:<name>[:<prefix>]`, `query:<name>` or `cookie:<name>`.
    pub fn parse(raw: &str) -> Result<Self, ExtractionRuleError> {
        let err = || ExtractionRuleError(raw.to_string());
        let mut parts = raw.trim().splitn(3, ':');
        let kind = parts.next().ok_or_else(err)?.trim();
        let name = parts
            .next()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(err)?
            .to_string();
        let rest = parts.next().map(|p| p.trim().to_string());

        match kind.to_ascii_lowercase().as_str() {
            "header" => Ok(Self::Header { name, prefix: rest }),
            "query" if rest.is_none() => Ok(Self::Query { name }),
            "cookie" if rest.is_none() => Ok(Self::Cookie { name }),
            _ => Err(err()),
        }
    }

    pub fn into_extractor(self) -> Box<dyn TokenExtractor> {
        match self {
            Self::Header { name, prefix } => {
                Box::new(AuthorizationHeaderTokenExtractor::new(name, prefix))
            }
            Self::Query { name } => Box::new(QueryParameterTokenExtractor::new(name)),
            Self::Cookie { name } => Box::new(CookieTokenExtractor::new(name)),
        }
    }
}

/// Parse a comma-separated extraction order. At least one rule is required.
pub fn parse_rules(raw: &str) -> Result<Vec<ExtractionRule>, ExtractionRuleError> {
    let rules = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ExtractionRule::parse)
        .collect::<Result<Vec<_>, _>>()?;

    if rules.is_empty() {
        return Err(ExtractionRuleError(raw.to_string()));
    }
    Ok(rules)
}
