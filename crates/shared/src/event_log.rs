//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! `jq` で効率的に調査できるよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! 既存の `tracing::error!` / `tracing::warn!` に `error.category` + `error.kind`
//! フィールドを直接追加する。定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`error.kind`）を使用。tracing の
//! `$($field:ident).+` パターンでサポートされ、JSON 出力でフラットなキーになる。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.tenant_id`: テナント ID
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.target`: 呼び出し先（宛先アドレスなど）
///
/// 呼び出し側のクレートは `tracing` に依存している必要がある。
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const QUOTE: &str = "quote";
        pub const NOTIFICATION: &str = "notification";
        pub const VERIFICATION: &str = "verification";
        pub const STORAGE: &str = "storage";
    }

    /// イベントアクション
    pub mod action {
        // 見積もり依頼
        pub const QUOTE_RECEIVED: &str = "quote.received";
        pub const QUOTE_REJECTED: &str = "quote.rejected";
        pub const QUOTE_PERSISTED: &str = "quote.persisted";
        pub const QUOTE_COMPLETED: &str = "quote.completed";

        // CAPTCHA
        pub const CAPTCHA_VERIFIED: &str = "captcha.verified";

        // 外部呼び出しの監査
        pub const EXTERNAL_CALL: &str = "external.call";

        // 通知
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const QUOTE: &str = "quote";
        pub const TENANT: &str = "tenant";
        pub const STAFF: &str = "staff";
        pub const EMAIL: &str = "email";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// インフラストラクチャ（ストレージ、監査ログファイル）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（CAPTCHA、認証基盤、メール送信）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const STORAGE: &str = "storage";
        pub const IDENTITY_LOOKUP: &str = "identity_lookup";
        pub const CAPTCHA: &str = "captcha";
        pub const MAIL_TRANSPORT: &str = "mail_transport";
        pub const TEMPLATE: &str = "template";
        pub const AUDIT_LOG: &str = "audit_log";
        pub const INTERNAL: &str = "internal";
    }
}

#[cfg(test)]
mod tests {
    use super::event;

    #[test]
    fn test_マクロはsubscriberなしでも呼び出せる() {
        crate::log_business_event!(
            event.category = event::category::QUOTE,
            event.action = event::action::QUOTE_RECEIVED,
            event.result = event::result::SUCCESS,
            "見積もり依頼を受信"
        );
    }
}
