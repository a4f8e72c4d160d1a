//! # 通知
//!
//! 見積もり依頼 1 件に対して送るメールのドメインモデル。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 説明 |
//! |---|---|---|
//! | [`NotificationAudience`] | 通知先区分 | 事業者（一次通知）、スタッフ、依頼者、障害アラート |
//! | [`DeliveryChannel`] | 配信チャネル | 配信結果と監査ログで使う区分名 |
//! | [`DeliveryOutcome`] | 配信結果 | 1 回の送信試行の結果。ログ専用 |
//!
//! ## 設計方針
//!
//! - **一次通知だけが結果を決める**: 事業者向けの送信結果だけが HTTP レスポンスに反映される
//! - **ベストエフォート**: その他の送信は失敗してもログに残すだけ
//! - **テンプレート分離**: 通知先区分とメール本文の生成は分離する

use strum::IntoStaticStr;
use thiserror::Error;

use crate::staff::StaffRecipient;

/// 通知送信エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートレンダリングに失敗
    #[error("テンプレートレンダリングに失敗: {0}")]
    TemplateFailed(String),
}

impl NotificationError {
    /// 送信基盤が返した直近のエラー内容
    ///
    /// 障害アラートの本文に載せる。
    pub fn reason(&self) -> &str {
        match self {
            Self::SendFailed(reason) | Self::TemplateFailed(reason) => reason,
        }
    }
}

/// 配信チャネル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DeliveryChannel {
    /// 事業者への一次通知
    Primary,
    /// スタッフへの通知
    Fanout,
    /// 依頼者への受付確認
    Confirmation,
    /// 一次通知失敗時のアラート
    Alert,
}

/// 通知先区分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationAudience {
    /// 事業者（一次通知）
    BusinessOwner,
    /// スタッフ
    Staff(StaffRecipient),
    /// 依頼者本人
    Submitter,
    /// 一次通知失敗のアラート
    FailureAlert {
        /// 送信基盤のエラー内容
        error: String,
    },
}

impl NotificationAudience {
    pub fn channel(&self) -> DeliveryChannel {
        match self {
            Self::BusinessOwner => DeliveryChannel::Primary,
            Self::Staff(_) => DeliveryChannel::Fanout,
            Self::Submitter => DeliveryChannel::Confirmation,
            Self::FailureAlert { .. } => DeliveryChannel::Alert,
        }
    }
}

/// 返信先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTo {
    pub email: String,
    pub name:  String,
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
/// 送信元アドレスは送信基盤の設定で固定され、ここでは表示名だけを持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信先メールアドレス
    pub to:        String,
    /// 送信元の表示名
    pub from_name: String,
    /// 返信先（依頼者に直接返信できるようにする場合）
    pub reply_to:  Option<ReplyTo>,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
    /// プレーンテキスト本文
    pub text_body: String,
}

/// 1 回の送信試行の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub channel:   DeliveryChannel,
    pub recipient: String,
    pub success:   bool,
    pub error:     Option<String>,
}

impl DeliveryOutcome {
    pub fn succeeded(channel: DeliveryChannel, recipient: impl Into<String>) -> Self {
        Self {
            channel,
            recipient: recipient.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(
        channel: DeliveryChannel,
        recipient: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            channel,
            recipient: recipient.into(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;
    use crate::staff::UserId;

    fn staff() -> StaffRecipient {
        StaffRecipient {
            user_id:          UserId::from_uuid(Uuid::from_u128(1)),
            display_name:     "Ana".to_string(),
            email:            "ana@example.com".to_string(),
            notify_new_quote: true,
        }
    }

    #[rstest]
    #[case(NotificationAudience::BusinessOwner, DeliveryChannel::Primary)]
    #[case(NotificationAudience::Staff(staff()), DeliveryChannel::Fanout)]
    #[case(NotificationAudience::Submitter, DeliveryChannel::Confirmation)]
    #[case(
        NotificationAudience::FailureAlert { error: "timeout".to_string() },
        DeliveryChannel::Alert
    )]
    fn test_通知先区分ごとにチャネルが決まる(
        #[case] audience: NotificationAudience,
        #[case] expected: DeliveryChannel,
    ) {
        assert_eq!(audience.channel(), expected);
    }

    #[test]
    fn test_チャネル名はスネークケースで表示される() {
        assert_eq!(DeliveryChannel::Fanout.to_string(), "fanout");
        assert_eq!(DeliveryChannel::Confirmation.to_string(), "confirmation");
    }

    #[test]
    fn test_失敗した配信結果はエラー内容を持つ() {
        let outcome = DeliveryOutcome::failed(
            DeliveryChannel::Primary,
            "owner@example.com",
            "connection refused",
        );

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_エラー内容は接頭辞なしで取り出せる() {
        let error = NotificationError::SendFailed("554 rejected".to_string());

        assert_eq!(error.reason(), "554 rejected");
        assert_eq!(error.to_string(), "メール送信に失敗: 554 rejected");
    }
}
