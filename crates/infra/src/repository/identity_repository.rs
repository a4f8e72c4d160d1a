//! # IdentityRepository
//!
//! 認証基盤の管理 API からスタッフのメールアドレスを取得するリポジトリ。

use async_trait::async_trait;
use quotedesk_domain::staff::UserId;
use serde::Deserialize;

use crate::{error::InfraError, rest::StorageClient};

/// 認証基盤リポジトリトレイト
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// ユーザーのメールアドレスを取得する
    ///
    /// ユーザーにメールアドレスが登録されていなければ `None` を返す。
    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, InfraError>;
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    #[serde(default)]
    email: Option<String>,
}

/// REST 実装の IdentityRepository（`/auth/v1/admin/users/{id}`）
#[derive(Clone)]
pub struct RestIdentityRepository {
    client: StorageClient,
}

impl RestIdentityRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityRepository for RestIdentityRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%user_id))]
    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, InfraError> {
        let user: IdentityUser = self
            .client
            .get_auth(&format!("admin/users/{user_id}"))
            .await?;
        Ok(user
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()))
    }
}
