//! # ユースケース層
//!
//! 見積もり依頼の受付パイプラインを構成するサービス群。
//!
//! - [`quote_intake`] - 受付全体の流れ（入口）
//! - [`tenant_resolver`] - 一次通知の宛先の解決
//! - [`recipient_resolver`] - スタッフ通知先の解決
//! - [`notification`] - メールの生成と送信
//! - [`audit`] - 外部呼び出しの監査ログ

pub mod audit;
pub mod notification;
pub mod quote_intake;
pub mod recipient_resolver;
pub mod tenant_resolver;

pub use audit::AuditLogger;
pub use notification::{Branding, NotificationService, TemplateRenderer};
pub use quote_intake::{QuoteIntakeInput, QuoteIntakeUseCase};
pub use recipient_resolver::RecipientResolver;
pub use tenant_resolver::TenantResolver;
