//! # StaffRepository
//!
//! スタッフ通知対象の選定に使うプロフィールと通知設定を取得するリポジトリ。
//!
//! ## 設計方針
//!
//! - **候補の取得**: テナント所属のプロフィールと管理者ロールのプロフィールを 1 回で取得
//! - **通知設定は値ごとに問い合わせる**: オプトイン行とオプトアウト行を別々に取得し、
//!   集合演算はドメイン層で行う

use async_trait::async_trait;
use quotedesk_domain::{
    staff::{PreferenceRow, StaffProfile, UserId},
    tenant::TenantId,
};

use crate::{error::InfraError, rest::StorageClient};

/// スタッフリポジトリトレイト
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// テナント所属または管理者ロールのプロフィールを取得する
    async fn find_candidates(&self, tenant_id: &TenantId) -> Result<Vec<StaffProfile>, InfraError>;

    /// 指定ユーザーのうち `notify_new_quote` が指定値の設定行を持つユーザー ID を取得する
    async fn find_preference_user_ids(
        &self,
        user_ids: &[UserId],
        notify_new_quote: bool,
    ) -> Result<Vec<UserId>, InfraError>;
}

/// REST 実装の StaffRepository（`profiles` / `notification_preferences`）
#[derive(Clone)]
pub struct RestStaffRepository {
    client: StorageClient,
}

impl RestStaffRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StaffRepository for RestStaffRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%tenant_id))]
    async fn find_candidates(&self, tenant_id: &TenantId) -> Result<Vec<StaffProfile>, InfraError> {
        let query = format!("or=(business_id.eq.{tenant_id},role.eq.admin)&select=id,full_name");
        self.client.select("profiles", &query).await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(count = user_ids.len(), notify_new_quote = notify_new_quote))]
    async fn find_preference_user_ids(
        &self,
        user_ids: &[UserId],
        notify_new_quote: bool,
    ) -> Result<Vec<UserId>, InfraError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = user_ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let query = format!("notify_new_quote=eq.{notify_new_quote}&user_id=in.({ids})&select=user_id");
        let rows: Vec<PreferenceRow> = self.client.select("notification_preferences", &query).await?;
        Ok(rows.into_iter().map(|row| row.user_id).collect())
    }
}
