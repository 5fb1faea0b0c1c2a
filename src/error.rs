/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - guard 構築 / guard 実行時エラーを統一的に変換
 *
 * Notes
 * - 認証失敗 (token なし・不正) は AppError ではない。guard の FailureReply がそのまま返る
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{GuardBuildError, GuardError};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "unauthorized".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GuardError> for AppError {
    fn from(e: GuardError) -> Self {
        tracing::error!(error = %e, "authentication aborted");
        AppError::Internal
    }
}

impl From<GuardBuildError> for AppError {
    fn from(e: GuardBuildError) -> Self {
        tracing::error!(error = %e, "failed to build token guard");
        AppError::Internal
    }
}
