/*
 * Responsibility
 * - middleware の公開インターフェース
 *   - auth::access: TokenGuard を各リクエストに適用
 *   - http: request id / body limit / timeout / access log
 */
pub mod auth;
pub mod http;
