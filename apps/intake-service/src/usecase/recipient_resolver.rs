//! # スタッフ通知先の解決
//!
//! 新しい見積もり依頼を知らせるスタッフの宛先一覧を組み立てる。
//!
//! ## 手順
//!
//! 1. テナント所属または管理者ロールのプロフィールを取得（候補 `U`）
//! 2. `U` が空なら通知しない
//! 3. 明示的なオプトイン行を取得（件数をログに出すだけで、絞り込みには使わない）
//! 4. 明示的なオプトアウト行を取得（除外集合 `O`）
//! 5. `N = U − O` の各ユーザーのメールアドレスを認証基盤から並行して取得
//! 6. 一次通知の宛先と同じアドレスは除く
//!
//! 1・3・4 の失敗はスタッフ通知全体を中止する（受付処理自体は続行）。
//! 5 の失敗はそのユーザーだけを飛ばす。

use std::{collections::HashSet, sync::Arc};

use futures::future::join_all;
use quotedesk_domain::{
    audit::{AuditOperation, AuditOutcome},
    staff::{StaffProfile, StaffRecipient, UserId, select_notify_set},
    tenant::Tenant,
};
use quotedesk_infra::{
    InfraError,
    repository::{IdentityRepository, StaffRepository},
};
use quotedesk_shared::event_log::error;

use super::AuditLogger;

/// スタッフ通知先の解決サービス
pub struct RecipientResolver {
    staff_repo:    Arc<dyn StaffRepository>,
    identity_repo: Arc<dyn IdentityRepository>,
    audit:         AuditLogger,
}

impl RecipientResolver {
    pub fn new(
        staff_repo: Arc<dyn StaffRepository>,
        identity_repo: Arc<dyn IdentityRepository>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            staff_repo,
            identity_repo,
            audit,
        }
    }

    /// スタッフ通知先を解決する
    ///
    /// 途中で失敗した場合は空の一覧を返す。
    #[tracing::instrument(skip_all, fields(tenant_id = %tenant.id()))]
    pub async fn resolve(&self, tenant: &Tenant) -> Vec<StaffRecipient> {
        let Some(notify_set) = self.notify_set(tenant).await else {
            return Vec::new();
        };

        let lookups = notify_set.iter().map(|profile| self.lookup(profile, tenant));
        let recipients: Vec<StaffRecipient> = join_all(lookups).await.into_iter().flatten().collect();

        tracing::debug!(count = recipients.len(), "スタッフ通知先を解決");
        recipients
    }

    /// 通知対象のプロフィール（`N = U − O`）を求める
    async fn notify_set(&self, tenant: &Tenant) -> Option<Vec<StaffProfile>> {
        let tenant_id = tenant.id().to_string();

        let candidates = self
            .audited(
                AuditOperation::ProfilesQuery,
                &tenant_id,
                self.staff_repo.find_candidates(tenant.id()),
            )
            .await?;
        if candidates.is_empty() {
            tracing::debug!("スタッフ候補がいないため通知しない");
            return Some(Vec::new());
        }

        let candidate_ids: Vec<UserId> = candidates.iter().map(|p| p.user_id.clone()).collect();

        let opted_in = self
            .audited(
                AuditOperation::OptInQuery,
                &tenant_id,
                self.staff_repo.find_preference_user_ids(&candidate_ids, true),
            )
            .await?;
        tracing::debug!(count = opted_in.len(), "明示的にオプトインしているスタッフ");

        let opted_out: HashSet<UserId> = self
            .audited(
                AuditOperation::OptOutQuery,
                &tenant_id,
                self.staff_repo.find_preference_user_ids(&candidate_ids, false),
            )
            .await?
            .into_iter()
            .collect();

        Some(select_notify_set(&candidates, &opted_out))
    }

    /// 1 人分のメールアドレスを解決する
    async fn lookup(&self, profile: &StaffProfile, tenant: &Tenant) -> Option<StaffRecipient> {
        let user_id = profile.user_id.to_string();

        let email = match self.identity_repo.find_email(&profile.user_id).await {
            Ok(Some(email)) if !email.trim().is_empty() => email.trim().to_string(),
            Ok(_) => {
                tracing::warn!(user_id = %user_id, "スタッフのメールアドレスが未登録");
                self.audit
                    .record(
                        AuditOperation::IdentityLookup,
                        &user_id,
                        AuditOutcome::Failure("メールアドレスが未登録です".to_string()),
                    )
                    .await;
                return None;
            }
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::EXTERNAL_SERVICE,
                    error.kind = error::kind::IDENTITY_LOOKUP,
                    error = %e,
                    user_id = %user_id,
                    "スタッフのメールアドレスの取得に失敗"
                );
                self.audit
                    .record(
                        AuditOperation::IdentityLookup,
                        &user_id,
                        AuditOutcome::Failure(e.to_string()),
                    )
                    .await;
                return None;
            }
        };

        self.audit
            .record(AuditOperation::IdentityLookup, &user_id, AuditOutcome::Success)
            .await;

        if tenant.is_contact_address(&email) {
            tracing::debug!(user_id = %user_id, "一次通知の宛先と同じため除外");
            return None;
        }

        Some(StaffRecipient::new(profile, email))
    }

    /// 問い合わせ結果を監査ログに残し、失敗なら `None` を返す
    async fn audited<T>(
        &self,
        operation: AuditOperation,
        target: &str,
        query: impl Future<Output = Result<T, InfraError>>,
    ) -> Option<T> {
        match query.await {
            Ok(value) => {
                self.audit.record(operation, target, AuditOutcome::Success).await;
                Some(value)
            }
            Err(e) => {
                tracing::warn!(
                    error.category = error::category::INFRASTRUCTURE,
                    error.kind = error::kind::STORAGE,
                    error = %e,
                    operation = operation.as_str(),
                    "スタッフ通知先の問い合わせに失敗したため通知を中止"
                );
                self.audit
                    .record(operation, target, AuditOutcome::Failure(e.to_string()))
                    .await;
                None
            }
        }
    }
}
