//! # ルーター構築
//!
//! 受付エンドポイントとヘルスチェックのルーティング、および共通レイヤーを組み立てる。
//! `main` と統合テストの両方がこの関数でルーターを作る。

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use quotedesk_shared::observability::make_request_span;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{QuoteState, health_check, method_not_allowed, preflight, submit_quote},
    middleware::extract_client_ip,
};

/// ルーターを構築する
///
/// # 引数
///
/// - `state`: 見積もり API の共有状態
/// - `allowed_origins`: CORS で許可するオリジン（完全一致）
pub fn build_router(state: Arc<QuoteState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route(
            "/send-quote",
            post(submit_quote)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .with_state(state)
        .route("/health", get(health_check))
        .layer(middleware::from_fn(extract_client_ip))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "不正なオリジンを CORS 設定から除外");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST])
        .allow_headers([CONTENT_TYPE])
}
