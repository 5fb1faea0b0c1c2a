/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - 認証は呼び出し側 (app.rs) が middleware::auth::access で v1 全体に掛ける
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::secured::secured;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/secured", get(secured))
}
