//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（lettre）、Noop（ローカル開発・送信無効化用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **エラー内容の保持**: 送信失敗時は送信基盤のエラー内容を
//!   [`NotificationError::SendFailed`] に入れて返す。障害アラートの本文に使われる

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopNotificationSender;
use quotedesk_domain::notification::{EmailMessage, NotificationError};
pub use smtp::{SmtpNotificationSender, SmtpSecurity, SmtpSettings};

/// メール送信トレイト
///
/// 通知基盤の中核。メール送信の具体的な方法を抽象化する。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
