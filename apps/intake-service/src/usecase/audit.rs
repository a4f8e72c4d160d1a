//! # 監査ログ記録
//!
//! 外部呼び出しの結果を監査ログに追記し、同じ内容をビジネスイベントとして出力する。
//! 追記に失敗してもエラーを返さない（呼び出し元のパイプラインに影響させない）。

use std::sync::Arc;

use quotedesk_domain::{
    audit::{AuditEntry, AuditOperation, AuditOutcome},
    clock::Clock,
    notification::DeliveryOutcome,
};
use quotedesk_infra::repository::AuditLogRepository;
use quotedesk_shared::event_log::{error, event};
use quotedesk_shared::log_business_event;

/// 監査ログ記録サービス
#[derive(Clone)]
pub struct AuditLogger {
    repo:  Arc<dyn AuditLogRepository>,
    clock: Arc<dyn Clock>,
}

impl AuditLogger {
    pub fn new(repo: Arc<dyn AuditLogRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// 外部呼び出し 1 回分を記録する
    pub async fn record(&self, operation: AuditOperation, target: &str, outcome: AuditOutcome) {
        let entry = AuditEntry::new(self.clock.now(), operation, target, outcome);
        self.append(entry).await;
    }

    /// 配信結果を記録する
    pub async fn record_delivery(&self, outcome: &DeliveryOutcome) {
        let entry = AuditEntry::from_delivery(self.clock.now(), outcome);
        self.append(entry).await;
    }

    async fn append(&self, entry: AuditEntry) {
        let result = if entry.outcome.is_success() {
            event::result::SUCCESS
        } else {
            event::result::FAILURE
        };
        log_business_event!(
            event.category = event_category(entry.operation),
            event.action = event::action::EXTERNAL_CALL,
            event.result = result,
            event.operation = entry.operation.as_str(),
            event.target = %entry.target,
            "外部呼び出しを記録"
        );

        if let Err(e) = self.repo.append(&entry).await {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::AUDIT_LOG,
                error = %e,
                entry = %entry,
                "監査ログの追記に失敗"
            );
        }
    }
}

/// 監査対象の操作をビジネスイベントのカテゴリに対応づける
fn event_category(operation: AuditOperation) -> &'static str {
    match operation {
        AuditOperation::CaptchaVerification => event::category::VERIFICATION,
        AuditOperation::Delivery(_) => event::category::NOTIFICATION,
        AuditOperation::TenantLookup
        | AuditOperation::QuoteInsert
        | AuditOperation::ProfilesQuery
        | AuditOperation::OptInQuery
        | AuditOperation::OptOutQuery
        | AuditOperation::IdentityLookup => event::category::STORAGE,
    }
}
