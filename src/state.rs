/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - guard: 起動時に組み立てた TokenGuard (以後は読み取り専用)
 * - Clone 前提で持つ (内部は Arc)
 */
use std::sync::Arc;

use crate::services::auth::TokenGuard;

#[derive(Clone, Debug)]
pub struct AppState {
    pub guard: Arc<TokenGuard>,
}

impl AppState {
    pub fn new(guard: Arc<TokenGuard>) -> Self {
        Self { guard }
    }
}
