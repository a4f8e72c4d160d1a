//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで通知メールを HTML/plaintext 両形式で生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: テンプレートはバイナリに埋め込まれる
//! - **エスケープはレンダリング時**: `.html` テンプレートは tera の autoescape で
//!   エスケープし、plaintext には生の値をそのまま出す
//! - **I/O なし**: 入力（依頼内容・テナント・通知先）だけからメールを組み立てる
//!
//! | 通知先 | 件名 | 差出人名 | Reply-To |
//! |--------|------|----------|----------|
//! | 事業者 | `New Quote Request - {service} - {name}` | テナント表示名 | 依頼者 |
//! | スタッフ | `New Quote Request — {name}` | ダッシュボード名 | 依頼者 |
//! | 依頼者 | `Quote Request Received - {テナント表示名}` | テナント表示名 | なし |
//! | アラート | `[ALERT] Quote email delivery failed — {name}` | アラート送信者名 | なし |

use quotedesk_domain::{
    notification::{EmailMessage, NotificationAudience, NotificationError, ReplyTo},
    submission::Submission,
    tenant::Tenant,
};
use tera::{Context, Tera};

/// 受付時刻の表示形式（例: `June 2, 2025 at 2:05 PM UTC`）
const SUBMITTED_AT_FORMAT: &str = "%B %-d, %Y at %-I:%M %p UTC";

/// メール本文に差し込む事業者情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    /// 依頼者に案内する電話番号（一次通知失敗時のレスポンスにも使う）
    pub business_phone:    String,
    /// 依頼者に案内する公開メールアドレス
    pub business_email:    String,
    pub tagline:           String,
    /// 受付内容を確認できるダッシュボードの URL
    pub dashboard_url:     String,
    /// スタッフ通知の差出人名
    pub dashboard_name:    String,
    /// アラートの差出人名
    pub alert_sender_name: String,
}

/// テンプレートレンダラー
///
/// tera テンプレートエンジンをラップし、依頼内容と通知先から
/// `EmailMessage` を生成する。
pub struct TemplateRenderer {
    engine:   Tera,
    branding: Branding,
}

impl TemplateRenderer {
    /// 新しいレンダラーインスタンスを作成
    ///
    /// `include_str!` で埋め込んだテンプレートを tera に登録する。
    pub fn new(branding: Branding) -> Result<Self, NotificationError> {
        let mut engine = Tera::default();

        engine
            .add_raw_templates(vec![
                (
                    "business_owner.html",
                    include_str!("../../../templates/notifications/business_owner.html"),
                ),
                (
                    "business_owner.txt",
                    include_str!("../../../templates/notifications/business_owner.txt"),
                ),
                (
                    "staff.html",
                    include_str!("../../../templates/notifications/staff.html"),
                ),
                (
                    "staff.txt",
                    include_str!("../../../templates/notifications/staff.txt"),
                ),
                (
                    "confirmation.html",
                    include_str!("../../../templates/notifications/confirmation.html"),
                ),
                (
                    "confirmation.txt",
                    include_str!("../../../templates/notifications/confirmation.txt"),
                ),
                (
                    "failure_alert.html",
                    include_str!("../../../templates/notifications/failure_alert.html"),
                ),
                (
                    "failure_alert.txt",
                    include_str!("../../../templates/notifications/failure_alert.txt"),
                ),
            ])
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(Self { engine, branding })
    }

    pub fn branding(&self) -> &Branding {
        &self.branding
    }

    /// 通知先ごとのメールメッセージを生成する
    pub fn render(
        &self,
        audience: &NotificationAudience,
        submission: &Submission,
        tenant: &Tenant,
    ) -> Result<EmailMessage, NotificationError> {
        let mut context = self.base_context(submission, tenant);
        let submitter = Some(ReplyTo {
            email: submission.email().to_string(),
            name:  submission.name().to_string(),
        });

        let (template_name, to, from_name, reply_to, subject) = match audience {
            NotificationAudience::BusinessOwner => (
                "business_owner",
                tenant.contact_email().to_string(),
                tenant.display_name().to_string(),
                submitter,
                format!(
                    "New Quote Request - {} - {}",
                    submission.service_label(),
                    submission.name()
                ),
            ),
            NotificationAudience::Staff(recipient) => {
                context.insert("recipient_name", &recipient.display_name);
                (
                    "staff",
                    recipient.email.clone(),
                    self.branding.dashboard_name.clone(),
                    submitter,
                    format!("New Quote Request — {}", submission.name()),
                )
            }
            NotificationAudience::Submitter => (
                "confirmation",
                submission.email().to_string(),
                tenant.display_name().to_string(),
                None,
                format!("Quote Request Received - {}", tenant.display_name()),
            ),
            NotificationAudience::FailureAlert { error } => {
                context.insert("error", error);
                (
                    "failure_alert",
                    tenant.contact_email().to_string(),
                    self.branding.alert_sender_name.clone(),
                    None,
                    format!("[ALERT] Quote email delivery failed — {}", submission.name()),
                )
            }
        };

        let html_body = self
            .engine
            .render(&format!("{template_name}.html"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        let text_body = self
            .engine
            .render(&format!("{template_name}.txt"), &context)
            .map_err(|e| NotificationError::TemplateFailed(e.to_string()))?;

        Ok(EmailMessage {
            to,
            from_name,
            reply_to,
            subject,
            html_body,
            text_body,
        })
    }

    /// すべてのテンプレートに共通するコンテキスト
    fn base_context(&self, submission: &Submission, tenant: &Tenant) -> Context {
        let mut context = Context::new();
        context.insert("name", submission.name());
        context.insert("email", submission.email());
        context.insert("phone", submission.phone_display());
        context.insert("company", submission.company_display());
        context.insert("service", &submission.service_label());
        context.insert("budget", &submission.budget_label());
        context.insert("timeline", &submission.timeline_label());
        context.insert("message", submission.message());
        context.insert("message_preview", &submission.message_preview());
        context.insert(
            "submitted_at",
            &submission
                .submitted_at()
                .format(SUBMITTED_AT_FORMAT)
                .to_string(),
        );
        context.insert("tenant_name", tenant.display_name());
        context.insert("business_phone", &self.branding.business_phone);
        context.insert("business_email", &self.branding.business_email);
        context.insert("tagline", &self.branding.tagline);
        context.insert("dashboard_url", &self.branding.dashboard_url);
        context.insert("dashboard_name", &self.branding.dashboard_name);
        context
    }
}
