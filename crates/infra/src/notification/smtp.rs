//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 本番では認証付きの SMTP リレー（STARTTLS / implicit TLS）、
//! 開発環境では Mailpit などの平文 SMTP サーバーに接続する。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    Address,
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use quotedesk_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;
use crate::error::InfraError;

/// SMTP 接続のセキュリティ方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// 平文で接続後に STARTTLS で昇格（587 番ポート）
    StartTls,
    /// 接続時から TLS（465 番ポート）
    Tls,
    /// TLS なし（Mailpit 等のローカル SMTP 向け）
    None,
}

/// SMTP 接続設定
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host:         String,
    pub port:         u16,
    pub security:     SmtpSecurity,
    /// ユーザー名とパスワード（未設定なら認証しない）
    pub credentials:  Option<(String, String)>,
    /// 認証済み送信元アドレス（すべてのメールで固定）
    pub from_address: String,
    pub timeout:      Duration,
}

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// 送信元アドレスは設定で固定し、表示名と返信先だけをメッセージごとに変える。
pub struct SmtpNotificationSender {
    transport:    AsyncSmtpTransport<Tokio1Executor>,
    from_address: Address,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// 接続はまだ行わない。最初の送信時に確立される。
    pub fn new(settings: &SmtpSettings) -> Result<Self, InfraError> {
        let from_address: Address = settings.from_address.parse().map_err(|e| {
            InfraError::unexpected(format!(
                "送信元アドレス不正 ({}): {e}",
                settings.from_address
            ))
        })?;

        let builder = match settings.security {
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                    .map_err(|e| InfraError::unexpected(format!("SMTP TLS 設定失敗: {e}")))?
            }
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
                .map_err(|e| InfraError::unexpected(format!("SMTP TLS 設定失敗: {e}")))?,
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            }
        };

        let builder = builder
            .port(settings.port)
            .timeout(Some(settings.timeout));
        let builder = match &settings.credentials {
            Some((username, password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            None => builder,
        };

        Ok(Self {
            transport: builder.build(),
            from_address,
        })
    }

    fn build_message(&self, email: &EmailMessage) -> Result<Message, NotificationError> {
        let to: Address = email
            .to
            .parse()
            .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?;

        let mut builder = Message::builder()
            .from(Mailbox::new(
                Some(email.from_name.clone()),
                self.from_address.clone(),
            ))
            .to(Mailbox::new(None, to))
            .subject(&email.subject);

        if let Some(reply_to) = &email.reply_to {
            let address: Address = reply_to
                .email
                .parse()
                .map_err(|e| NotificationError::SendFailed(format!("返信先アドレス不正: {e}")))?;
            builder = builder.reply_to(Mailbox::new(Some(reply_to.name.clone()), address));
        }

        builder
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = self.build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use quotedesk_domain::notification::ReplyTo;

    use super::*;

    fn settings() -> SmtpSettings {
        SmtpSettings {
            host:         "localhost".to_string(),
            port:         1025,
            security:     SmtpSecurity::None,
            credentials:  None,
            from_address: "noreply@example.com".to_string(),
            timeout:      Duration::from_secs(5),
        }
    }

    fn email(reply_to: Option<ReplyTo>) -> EmailMessage {
        EmailMessage {
            to: "owner@example.com".to_string(),
            from_name: "DC Metro Construction".to_string(),
            reply_to,
            subject: "New Quote Request - Other - Jane".to_string(),
            html_body: "<p>Hello</p>".to_string(),
            text_body: "Hello".to_string(),
        }
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SmtpNotificationSender>();
    }

    #[test]
    fn 不正な送信元アドレスでは構築に失敗する() {
        let settings = SmtpSettings {
            from_address: "not-an-address".to_string(),
            ..settings()
        };

        assert!(SmtpNotificationSender::new(&settings).is_err());
    }

    #[tokio::test]
    async fn 送信元は固定アドレスと表示名の組み合わせになる() {
        let sender = SmtpNotificationSender::new(&settings()).unwrap();

        let message = sender.build_message(&email(None)).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("noreply@example.com"));
        assert!(formatted.contains("DC Metro Construction"));
        assert!(!formatted.contains("Reply-To:"));
    }

    #[tokio::test]
    async fn 返信先が指定されていればreply_toヘッダーが付く() {
        let sender = SmtpNotificationSender::new(&settings()).unwrap();
        let reply_to = ReplyTo {
            email: "jane@example.com".to_string(),
            name:  "Jane Doe".to_string(),
        };

        let message = sender.build_message(&email(Some(reply_to))).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("Reply-To:"));
        assert!(formatted.contains("jane@example.com"));
    }

    #[tokio::test]
    async fn 不正な宛先はsend_failedになる() {
        let sender = SmtpNotificationSender::new(&settings()).unwrap();
        let mut message = email(None);
        message.to = "broken".to_string();

        let result = sender.build_message(&message);

        assert!(matches!(result, Err(NotificationError::SendFailed(_))));
    }
}
