//! # テナント解決
//!
//! ストレージに登録された事業者の連絡先で、静的設定の宛先と表示名を上書きする。
//! 取得できなければ静的設定をそのまま使う（エラーは監査ログにのみ残す）。

use std::sync::Arc;

use quotedesk_domain::{
    audit::{AuditOperation, AuditOutcome},
    tenant::Tenant,
};
use quotedesk_infra::repository::TenantRepository;
use quotedesk_shared::event_log::error;

use super::AuditLogger;

const CONTACT_NOT_REGISTERED: &str = "連絡先が登録されていません";

/// テナント解決サービス
pub struct TenantResolver {
    repo:     Arc<dyn TenantRepository>,
    defaults: Tenant,
    audit:    AuditLogger,
}

impl TenantResolver {
    pub fn new(repo: Arc<dyn TenantRepository>, defaults: Tenant, audit: AuditLogger) -> Self {
        Self {
            repo,
            defaults,
            audit,
        }
    }

    /// 静的設定のテナント
    pub fn defaults(&self) -> &Tenant {
        &self.defaults
    }

    /// 通知に使うテナントを解決する
    pub async fn resolve(&self) -> Tenant {
        let tenant_id = self.defaults.id().to_string();

        match self.repo.find_contact(self.defaults.id()).await {
            Ok(Some(contact)) if !contact.contact_email.trim().is_empty() => {
                self.audit
                    .record(AuditOperation::TenantLookup, &tenant_id, AuditOutcome::Success)
                    .await;
                self.defaults.clone().with_contact(contact)
            }
            Ok(_) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    "事業者の連絡先が見つからないため静的設定を使用"
                );
                self.audit
                    .record(
                        AuditOperation::TenantLookup,
                        &tenant_id,
                        AuditOutcome::Failure(CONTACT_NOT_REGISTERED.to_string()),
                    )
                    .await;
                self.defaults.clone()
            }
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::STORAGE,
                    error = %e,
                    tenant_id = %tenant_id,
                    "事業者の連絡先の取得に失敗したため静的設定を使用"
                );
                self.audit
                    .record(
                        AuditOperation::TenantLookup,
                        &tenant_id,
                        AuditOutcome::Failure(e.to_string()),
                    )
                    .await;
                self.defaults.clone()
            }
        }
    }
}
