//! # 見積もり依頼の受付
//!
//! 1 件の見積もり依頼を検証してから保存し、関係者へ通知する。
//!
//! ## 状態遷移
//!
//! ```text
//! Validated → Authenticated → Persisted → PrimaryNotified → FannedOut → ConfirmationSent
//! ```
//!
//! - 入力検証と CAPTCHA 検証の失敗だけが処理を打ち切る（外部への書き込み・送信は一切しない）
//! - 保存・スタッフ通知・受付確認の失敗はログに残して続行する
//! - 呼び出し元に返す成否は事業者への一次通知だけで決まる。失敗した場合は
//!   受付確認を送らず、代わりにアラートを 1 通だけ送る
//! - どのステップもリトライしない

use std::sync::Arc;

use futures::future::join_all;
use quotedesk_domain::{
    audit::{AuditOperation, AuditOutcome},
    clock::Clock,
    notification::NotificationAudience,
    submission::{RawSubmission, Submission},
    tenant::Tenant,
};
use quotedesk_infra::{
    captcha::{CaptchaError, CaptchaVerifier},
    repository::QuoteRepository,
};
use quotedesk_shared::{
    event_log::{error, event},
    log_business_event,
};

use super::{AuditLogger, NotificationService, RecipientResolver, TenantResolver};
use crate::error::IntakeError;

/// 監査ログに残す CAPTCHA 検証の呼び出し先
const CAPTCHA_TARGET: &str = "turnstile";
/// 監査ログに残す保存先テーブル
const QUOTES_TARGET: &str = "quotes";

/// 受付処理への入力
#[derive(Debug, Clone, Default)]
pub struct QuoteIntakeInput {
    pub submission:    RawSubmission,
    /// フォームに埋め込まれた CAPTCHA トークン
    pub captcha_token: Option<String>,
    pub client_ip:     Option<String>,
}

/// 見積もり依頼の受付ユースケース
pub struct QuoteIntakeUseCase {
    captcha:            Arc<dyn CaptchaVerifier>,
    quote_repo:         Arc<dyn QuoteRepository>,
    tenant_resolver:    TenantResolver,
    recipient_resolver: RecipientResolver,
    notifications:      NotificationService,
    audit:              AuditLogger,
    clock:              Arc<dyn Clock>,
}

impl QuoteIntakeUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        captcha: Arc<dyn CaptchaVerifier>,
        quote_repo: Arc<dyn QuoteRepository>,
        tenant_resolver: TenantResolver,
        recipient_resolver: RecipientResolver,
        notifications: NotificationService,
        audit: AuditLogger,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            captcha,
            quote_repo,
            tenant_resolver,
            recipient_resolver,
            notifications,
            audit,
            clock,
        }
    }

    /// 見積もり依頼を受け付ける
    ///
    /// # エラー
    ///
    /// - `IntakeError::Validation`: 必須項目の不足・メールアドレスの形式不正
    /// - `IntakeError::VerificationRequired`: CAPTCHA トークンがない
    /// - `IntakeError::VerificationFailed`: CAPTCHA 検証が失敗・拒否された
    /// - `IntakeError::Delivery`: 事業者への一次通知に失敗した
    pub async fn submit(&self, input: QuoteIntakeInput) -> Result<(), IntakeError> {
        let tenant_id = self.tenant_resolver.defaults().id().clone();

        let submission = Submission::parse(input.submission, self.clock.now()).map_err(|errors| {
            log_business_event!(
                event.category = event::category::QUOTE,
                event.action = event::action::QUOTE_REJECTED,
                event.tenant_id = %tenant_id,
                event.entity_type = event::entity_type::QUOTE,
                event.result = event::result::FAILURE,
                reason = %errors,
                "見積もり依頼を入力検証で拒否"
            );
            IntakeError::Validation(errors)
        })?;

        log_business_event!(
            event.category = event::category::QUOTE,
            event.action = event::action::QUOTE_RECEIVED,
            event.tenant_id = %tenant_id,
            event.entity_type = event::entity_type::QUOTE,
            event.result = event::result::SUCCESS,
            quote.service = %submission.service_label(),
            "見積もり依頼を受信"
        );

        self.verify_captcha(input.captcha_token.as_deref(), input.client_ip.as_deref())
            .await?;

        let tenant = self.tenant_resolver.resolve().await;
        self.persist(&submission, &tenant).await;

        let primary = self
            .notifications
            .deliver(NotificationAudience::BusinessOwner, &submission, &tenant)
            .await;

        self.fan_out(&submission, &tenant).await;

        let result = if primary.success {
            self.notifications
                .deliver(NotificationAudience::Submitter, &submission, &tenant)
                .await;
            Ok(())
        } else {
            let error = primary
                .error
                .clone()
                .unwrap_or_else(|| "unknown error".to_string());
            self.notifications
                .deliver(NotificationAudience::FailureAlert { error }, &submission, &tenant)
                .await;
            Err(IntakeError::Delivery {
                phone: self.notifications.renderer().branding().business_phone.clone(),
            })
        };

        let outcome = if result.is_ok() {
            event::result::SUCCESS
        } else {
            event::result::FAILURE
        };
        log_business_event!(
            event.category = event::category::QUOTE,
            event.action = event::action::QUOTE_COMPLETED,
            event.tenant_id = %tenant_id,
            event.entity_type = event::entity_type::QUOTE,
            event.result = outcome,
            "見積もり依頼の受付処理が完了"
        );

        result
    }

    /// CAPTCHA トークンを検証する
    ///
    /// トークンがなければ外部サービスを呼ばずに拒否する。
    async fn verify_captcha(&self, token: Option<&str>, client_ip: Option<&str>) -> Result<(), IntakeError> {
        let token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(IntakeError::VerificationRequired)?;

        let result = self.captcha.verify(token, client_ip).await;
        self.audit
            .record(
                AuditOperation::CaptchaVerification,
                CAPTCHA_TARGET,
                AuditOutcome::from(&result),
            )
            .await;

        match result {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::VERIFICATION,
                    event.action = event::action::CAPTCHA_VERIFIED,
                    event.result = event::result::SUCCESS,
                    "CAPTCHA 検証に成功"
                );
                Ok(())
            }
            Err(CaptchaError::Rejected(codes)) => {
                tracing::info!(error_codes = ?codes, "CAPTCHA 検証で拒否");
                Err(IntakeError::VerificationFailed)
            }
            Err(e @ CaptchaError::Request(_)) => {
                tracing::warn!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::CAPTCHA,
                    error = %e,
                    "CAPTCHA 検証サービスの呼び出しに失敗"
                );
                Err(IntakeError::VerificationFailed)
            }
        }
    }

    /// 依頼内容を保存する（失敗しても処理は続ける）
    async fn persist(&self, submission: &Submission, tenant: &Tenant) {
        let result = self
            .quote_repo
            .insert(&submission.to_persisted(tenant.id()))
            .await;
        self.audit
            .record(AuditOperation::QuoteInsert, QUOTES_TARGET, AuditOutcome::from(&result))
            .await;

        match result {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::QUOTE,
                    event.action = event::action::QUOTE_PERSISTED,
                    event.tenant_id = %tenant.id(),
                    event.entity_type = event::entity_type::QUOTE,
                    event.result = event::result::SUCCESS,
                    "見積もり依頼を保存"
                );
            }
            Err(e) => {
                tracing::error!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::STORAGE,
                    error = %e,
                    span_trace = %e.span_trace(),
                    "見積もり依頼の保存に失敗"
                );
            }
        }
    }

    /// スタッフ全員へ並行して通知する
    async fn fan_out(&self, submission: &Submission, tenant: &Tenant) {
        let recipients = self.recipient_resolver.resolve(tenant).await;
        if recipients.is_empty() {
            return;
        }

        let sends = recipients.into_iter().map(|recipient| {
            self.notifications
                .deliver(NotificationAudience::Staff(recipient), submission, tenant)
        });
        let outcomes = join_all(sends).await;

        let failed = outcomes.iter().filter(|outcome| !outcome.success).count();
        tracing::info!(
            sent = outcomes.len() - failed,
            failed,
            "スタッフへの通知が完了"
        );
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::test_utils::{TEST_BUSINESS_PHONE, TEST_CONTACT_EMAIL, TestHarness};

    fn valid_input() -> QuoteIntakeInput {
        QuoteIntakeInput {
            submission:    RawSubmission {
                name: Some("Jane Doe".to_string()),
                email: Some("jane@example.com".to_string()),
                message: Some("Need a new kitchen".to_string()),
                ..Default::default()
            },
            captcha_token: Some("token-123".to_string()),
            client_ip:     Some("203.0.113.7".to_string()),
        }
    }

    #[tokio::test]
    async fn test_入力検証はcaptcha検証より先に行う() {
        let harness = TestHarness::new();
        let mut input = valid_input();
        input.submission.email = Some("not-an-email".to_string());

        let error = assert_err!(harness.usecase().submit(input).await);

        assert!(matches!(error, IntakeError::Validation(_)));
        assert!(harness.captcha.calls().is_empty());
    }

    #[tokio::test]
    async fn test_空白だけのトークンは検証サービスを呼ばずに拒否する() {
        let harness = TestHarness::new();
        let mut input = valid_input();
        input.captcha_token = Some("   ".to_string());

        let error = assert_err!(harness.usecase().submit(input).await);

        assert!(matches!(error, IntakeError::VerificationRequired));
        assert!(harness.captcha.calls().is_empty());
        assert!(harness.audit.entries().is_empty());
    }

    #[tokio::test]
    async fn test_一次通知の成功時は受付確認を最後に送る() {
        let harness = TestHarness::new();

        assert_ok!(harness.usecase().submit(valid_input()).await);

        let recipients: Vec<String> = harness
            .sender
            .attempted_emails()
            .into_iter()
            .map(|email| email.to)
            .collect();
        assert_eq!(
            recipients,
            vec![TEST_CONTACT_EMAIL.to_string(), "jane@example.com".to_string()]
        );
        assert_eq!(
            harness.captcha.calls(),
            vec![("token-123".to_string(), Some("203.0.113.7".to_string()))]
        );
    }

    #[tokio::test]
    async fn test_一次通知の失敗時は電話番号つきのエラーを返しアラートを送る() {
        let harness = TestHarness::new();
        harness.sender.fail_for(TEST_CONTACT_EMAIL);

        let error = assert_err!(harness.usecase().submit(valid_input()).await);

        match error {
            IntakeError::Delivery { phone } => assert_eq!(phone, TEST_BUSINESS_PHONE),
            other => panic!("unexpected error: {other:?}"),
        }
        let subjects: Vec<String> = harness
            .sender
            .attempted_emails()
            .into_iter()
            .map(|email| email.subject)
            .collect();
        assert_eq!(
            subjects,
            vec![
                "New Quote Request - Not specified - Jane Doe".to_string(),
                "[ALERT] Quote email delivery failed — Jane Doe".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_テナント取得に失敗しても既定の宛先で受け付ける() {
        let harness = TestHarness::new();
        harness.tenants.fail();

        assert_ok!(harness.usecase().submit(valid_input()).await);

        assert_eq!(harness.sender.sent_emails()[0].to, TEST_CONTACT_EMAIL);
        assert_eq!(harness.quotes.inserted().len(), 1);
    }
}
