//! # ヘルスチェックハンドラ
//!
//! ロードバランサーやコンテナオーケストレーターからの死活確認に応答する。
//!
//! ```text
//! GET /health
//! ```

use axum::Json;
use quotedesk_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
