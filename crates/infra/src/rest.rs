//! # ストレージ REST API クライアント
//!
//! PostgREST 互換のストレージ API と、同じホストに載っている認証基盤の
//! 管理 API を呼び出すための薄いクライアント。
//!
//! すべてのリクエストにサービスキーを `apikey` ヘッダーと
//! `Authorization: Bearer` ヘッダーの両方で付与する。
//! タイムアウトは渡された `reqwest::Client` の設定に従う。

use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};

use crate::error::InfraError;

/// ストレージ REST API クライアント
#[derive(Clone)]
pub struct StorageClient {
    base_url:    String,
    service_key: String,
    client:      reqwest::Client,
}

impl StorageClient {
    /// 新しいクライアントを作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: ストレージのベース URL（例: `https://xyz.supabase.co`）
    /// - `service_key`: サービスロールキー
    /// - `client`: タイムアウト設定済みの HTTP クライアント
    pub fn new(base_url: &str, service_key: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        }
    }

    /// REST テーブルを検索する（`GET /rest/v1/{table}?{query}`）
    ///
    /// `query` はエンコード済みのクエリ文字列をそのまま渡す。
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, InfraError> {
        let url = format!("{}/rest/v1/{}?{}", self.base_url, table, query);
        let response = self.authorized(self.client.get(&url)).send().await?;
        read_json(response).await
    }

    /// REST テーブルに 1 行挿入する（`POST /rest/v1/{table}`）
    ///
    /// `Prefer: return=minimal` を付けるため、レスポンスボディは読まない。
    pub async fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<(), InfraError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        let response = self
            .authorized(self.client.post(&url))
            .header("Prefer", "return=minimal")
            .json(row)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(InfraError::unexpected_status(status.as_u16(), body))
    }

    /// 認証基盤の管理 API を呼び出す（`GET /auth/v1/{path}`）
    pub async fn get_auth<T: DeserializeOwned>(&self, path: &str) -> Result<T, InfraError> {
        let url = format!("{}/auth/v1/{}", self.base_url, path.trim_start_matches('/'));
        let response = self.authorized(self.client.get(&url)).send().await?;
        read_json(response).await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

/// 外部呼び出し用の HTTP クライアントを作る
///
/// CAPTCHA 検証とストレージ呼び出しで共有する。
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, InfraError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| InfraError::unexpected(format!("HTTP クライアント構築失敗: {e}")))
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, InfraError> {
    let status = response.status();
    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let body = response.text().await.unwrap_or_default();
    Err(InfraError::unexpected_status(status.as_u16(), body))
}
