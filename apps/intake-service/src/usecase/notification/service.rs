//! # 通知サービス
//!
//! テンプレートレンダリング → メール送信 → 監査ログ記録を統合するサービス。
//!
//! ## 設計方針
//!
//! - **結果を値で返す**: `deliver()` はエラーを返さず、[`DeliveryOutcome`] に成否を載せる。
//!   一次通知の成否だけが呼び出し元のレスポンスを左右する
//! - **送信ごとのタイムアウト**: 送信基盤のタイムアウトに加え、`tokio::time::timeout` で上限を設ける
//! - **リトライしない**: 失敗はそのまま監査ログに残す

use std::{sync::Arc, time::Duration};

use quotedesk_domain::{
    notification::{DeliveryOutcome, NotificationAudience, NotificationError},
    submission::Submission,
    tenant::Tenant,
};
use quotedesk_infra::notification::NotificationSender;
use quotedesk_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::TemplateRenderer;
use crate::usecase::AuditLogger;

/// 通知サービス
pub struct NotificationService {
    sender:            Arc<dyn NotificationSender>,
    template_renderer: TemplateRenderer,
    audit:             AuditLogger,
    send_timeout:      Duration,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        template_renderer: TemplateRenderer,
        audit: AuditLogger,
        send_timeout: Duration,
    ) -> Self {
        Self {
            sender,
            template_renderer,
            audit,
            send_timeout,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.template_renderer
    }

    /// 1 通送信し、結果を監査ログに残す
    pub async fn deliver(
        &self,
        audience: NotificationAudience,
        submission: &Submission,
        tenant: &Tenant,
    ) -> DeliveryOutcome {
        let channel = audience.channel();
        let channel_str: &str = channel.into();

        let result = match self.template_renderer.render(&audience, submission, tenant) {
            Ok(email) => {
                let recipient = email.to.clone();
                let sent = match tokio::time::timeout(self.send_timeout, self.sender.send_email(&email)).await {
                    Ok(result) => result,
                    Err(_) => Err(NotificationError::SendFailed(format!(
                        "送信が {} 秒以内に完了しませんでした",
                        self.send_timeout.as_secs()
                    ))),
                };
                (recipient, sent)
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::TEMPLATE,
                    error = %e,
                    channel = channel_str,
                    "通知テンプレートのレンダリングに失敗"
                );
                (fallback_recipient(&audience, submission, tenant), Err(e))
            }
        };

        let outcome = match result {
            (recipient, Ok(())) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.tenant_id = %tenant.id(),
                    event.entity_type = event::entity_type::EMAIL,
                    event.result = event::result::SUCCESS,
                    notification.channel = channel_str,
                    notification.recipient = %recipient,
                    "通知メール送信成功"
                );
                DeliveryOutcome::succeeded(channel, recipient)
            }
            (recipient, Err(e)) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.tenant_id = %tenant.id(),
                    event.entity_type = event::entity_type::EMAIL,
                    event.result = event::result::FAILURE,
                    notification.channel = channel_str,
                    notification.recipient = %recipient,
                    error.kind = error::kind::MAIL_TRANSPORT,
                    error = %e,
                    "通知メール送信失敗"
                );
                DeliveryOutcome::failed(channel, recipient, e.reason())
            }
        };

        self.audit.record_delivery(&outcome).await;
        outcome
    }
}

/// レンダリングに失敗したときに監査ログへ残す宛先
fn fallback_recipient(audience: &NotificationAudience, submission: &Submission, tenant: &Tenant) -> String {
    match audience {
        NotificationAudience::BusinessOwner | NotificationAudience::FailureAlert { .. } => {
            tenant.contact_email().to_string()
        }
        NotificationAudience::Staff(recipient) => recipient.email.clone(),
        NotificationAudience::Submitter => submission.email().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use quotedesk_domain::{
        audit::{AuditOperation, AuditOutcome},
        clock::FixedClock,
        notification::{DeliveryChannel, EmailMessage},
        submission::RawSubmission,
        tenant::TenantId,
    };
    use quotedesk_infra::mock::{MockAuditLogRepository, MockNotificationSender};

    use super::*;
    use crate::usecase::notification::Branding;

    fn branding() -> Branding {
        Branding {
            business_phone:    "(202) 555-1234".to_string(),
            business_email:    "info@example.com".to_string(),
            tagline:           "Building Excellence".to_string(),
            dashboard_url:     "http://localhost:8888/dashboard/".to_string(),
            dashboard_name:    "IPW Dashboard".to_string(),
            alert_sender_name: "IPW Alert System".to_string(),
        }
    }

    fn service(
        sender: Arc<dyn NotificationSender>,
        audit_repo: &MockAuditLogRepository,
        timeout: Duration,
    ) -> NotificationService {
        let audit = AuditLogger::new(
            Arc::new(audit_repo.clone()),
            Arc::new(FixedClock::new(Utc::now())),
        );
        NotificationService::new(
            sender,
            TemplateRenderer::new(branding()).unwrap(),
            audit,
            timeout,
        )
    }

    fn tenant() -> Tenant {
        Tenant::new(
            TenantId::from_uuid(uuid::Uuid::nil()),
            "owner@example.com",
            "DC Metro Construction",
        )
    }

    fn submission() -> Submission {
        Submission::parse(
            RawSubmission {
                name: Some("Jane Doe".to_string()),
                email: Some("jane@example.com".to_string()),
                message: Some("Need a new roof".to_string()),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_送信成功を監査ログに記録する() {
        let sender = MockNotificationSender::new();
        let audit_repo = MockAuditLogRepository::new();
        let service = service(Arc::new(sender.clone()), &audit_repo, Duration::from_secs(5));

        let outcome = service
            .deliver(NotificationAudience::BusinessOwner, &submission(), &tenant())
            .await;

        assert_eq!(
            outcome,
            DeliveryOutcome::succeeded(DeliveryChannel::Primary, "owner@example.com")
        );
        assert_eq!(sender.sent_emails().len(), 1);
        let entries = audit_repo.entries();
        assert_eq!(entries[0].operation, AuditOperation::Delivery(DeliveryChannel::Primary));
        assert_eq!(entries[0].outcome, AuditOutcome::Success);
    }

    #[tokio::test]
    async fn test_送信失敗はエラー内容付きの結果になる() {
        let sender = MockNotificationSender::new();
        sender.fail_for("jane@example.com");
        let audit_repo = MockAuditLogRepository::new();
        let service = service(Arc::new(sender.clone()), &audit_repo, Duration::from_secs(5));

        let outcome = service
            .deliver(NotificationAudience::Submitter, &submission(), &tenant())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.channel, DeliveryChannel::Confirmation);
        assert_eq!(
            outcome.error.as_deref(),
            Some("SMTP Error: could not deliver to jane@example.com")
        );
        assert!(!audit_repo.entries()[0].outcome.is_success());
    }

    /// 応答しない送信基盤
    struct HangingSender;

    #[async_trait]
    impl NotificationSender for HangingSender {
        async fn send_email(&self, _email: &EmailMessage) -> Result<(), NotificationError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_送信が時間内に終わらなければ失敗として扱う() {
        let audit_repo = MockAuditLogRepository::new();
        let service = service(Arc::new(HangingSender), &audit_repo, Duration::from_secs(5));

        let outcome = service
            .deliver(NotificationAudience::BusinessOwner, &submission(), &tenant())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.recipient, "owner@example.com");
        assert_eq!(audit_repo.entries().len(), 1);
    }
}
