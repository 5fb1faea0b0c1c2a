/*
 * Responsibility
 * - Handler から見える「認証済みコンテキスト」の型
 * - middleware が guard を通して request extensions に格納し、handler はこの型だけを受け取る
 *
 * Notes
 * - token の抽出・検証・principal 解決は services::auth 側の責務
 */
use std::collections::BTreeSet;

use crate::services::auth::AuthenticatedToken;

/// 認証済みのリクエストに付与されるコンテキスト
#[derive(Debug, Clone)]
pub struct AuthCtx {
    token: AuthenticatedToken,
}

impl AuthCtx {
    pub fn new(token: AuthenticatedToken) -> Self {
        Self { token }
    }

    pub fn identity(&self) -> &str {
        self.token.identity()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        self.token.authorization_attributes()
    }

    pub fn token(&self) -> &AuthenticatedToken {
        &self.token
    }
}
