/*
 * Responsibility
 * - GET /api/v1/secured
 * - 認証済み principal の identity / roles を返す (guard の疎通確認用)
 */
use axum::Json;

use crate::api::v1::dto::secured::SecuredResponse;
use crate::api::v1::extractors::AuthCtxExtractor;

pub async fn secured(AuthCtxExtractor(ctx): AuthCtxExtractor) -> Json<SecuredResponse> {
    Json(SecuredResponse {
        success: true,
        identity: ctx.identity().to_string(),
        roles: ctx.roles().iter().cloned().collect(),
    })
}
