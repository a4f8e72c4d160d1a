//! # インフラ層エラー定義
//!
//! ストレージ、認証基盤、監査ログファイルとの通信で発生するエラーを表現する。
//!
//! ## 設計方針
//!
//! - **エラーの変換**: reqwest::Error, serde_json::Error, std::io::Error をラップ
//! - **ドメインエラーとの分離**: インフラ固有のエラーを明示
//! - **呼び出し元に詳細を返さない**: レスポンスには使わず、ログと監査ログにだけ残す
//! - **SpanTrace 自動捕捉**: `From` 実装や convenience constructor で
//!   エラー生成時の呼び出し経路を自動記録する
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Http, Timeout, UnexpectedStatus 等）

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
///
/// ## パターンマッチ
///
/// ```ignore
/// match error.kind() {
///     InfraErrorKind::UnexpectedStatus { status, .. } => { /* ステータス別処理 */ }
///     _ => { /* その他 */ }
/// }
/// ```
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// HTTP 通信エラー
    ///
    /// 接続失敗、TLS エラー、レスポンスボディの読み取り失敗など。
    #[error("HTTP 通信エラー: {0}")]
    Http(#[source] reqwest::Error),

    /// タイムアウト
    ///
    /// 外部呼び出しが設定した時間内に完了しなかった場合。
    #[error("タイムアウト: {0}")]
    Timeout(String),

    /// 想定外の HTTP ステータス
    #[error("想定外のステータス {status}: {body}")]
    UnexpectedStatus {
        /// HTTP ステータスコード
        status: u16,
        /// レスポンスボディ（診断用）
        body:   String,
    },

    /// シリアライズ/デシリアライズエラー
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// ファイル I/O エラー
    #[error("I/O エラー: {0}")]
    Io(#[source] std::io::Error),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

// ===== InfraError のメソッド =====

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    // ===== Convenience constructors =====

    /// タイムアウトエラーを生成する
    pub fn timeout(operation: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Timeout(operation.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 想定外ステータスのエラーを生成する
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::UnexpectedStatus {
                status,
                body: body.into(),
            },
            span_trace: SpanTrace::capture(),
        }
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

// ===== トレイト実装 =====

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<reqwest::Error> for InfraError {
    fn from(source: reqwest::Error) -> Self {
        let kind = if source.is_timeout() {
            InfraErrorKind::Timeout(source.to_string())
        } else if source.is_decode() {
            InfraErrorKind::Unexpected(format!("レスポンスの解析に失敗: {source}"))
        } else {
            InfraErrorKind::Http(source)
        };
        Self {
            kind,
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Serialization(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(source: std::io::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Io(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt as _;

    use super::*;

    /// テスト用に ErrorLayer 付き subscriber を設定する
    fn with_error_layer(f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(tracing_error::ErrorLayer::default());
        let _guard = tracing::subscriber::set_default(subscriber);
        f();
    }

    #[test]
    fn test_from_serde_json_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_profiles_query");
            let _enter = span.enter();

            let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
            let err: InfraError = json_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Serialization(_)));
            let trace_str = format!("{}", err.span_trace());
            assert!(
                trace_str.contains("test_profiles_query"),
                "SpanTrace がスパン名を含むこと: {trace_str}",
            );
        });
    }

    #[test]
    fn test_from_io_errorでspan_traceがキャプチャされる() {
        with_error_layer(|| {
            let span = tracing::info_span!("test_audit_append");
            let _enter = span.enter();

            let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
            let err: InfraError = io_err.into();

            assert!(matches!(err.kind(), InfraErrorKind::Io(_)));
            assert!(format!("{}", err.span_trace()).contains("test_audit_append"));
        });
    }

    #[test]
    fn test_unexpected_statusでステータスとボディを保持する() {
        with_error_layer(|| {
            let err = InfraError::unexpected_status(503, "unavailable");

            assert!(matches!(
                err.kind(),
                InfraErrorKind::UnexpectedStatus { status: 503, body } if body == "unavailable"
            ));
            assert_eq!(format!("{err}"), "想定外のステータス 503: unavailable");
        });
    }

    #[test]
    fn test_timeoutで操作名を保持する() {
        let err = InfraError::timeout("identity_lookup");
        assert!(matches!(err.kind(), InfraErrorKind::Timeout(op) if op == "identity_lookup"));
    }

    #[test]
    fn test_sourceがinfra_error_kindに委譲する() {
        use std::error::Error;

        let io_err = std::io::Error::other("disk full");
        let err: InfraError = io_err.into();

        assert!(err.source().is_some());
        assert!(InfraError::unexpected("x").source().is_none());
    }
}
