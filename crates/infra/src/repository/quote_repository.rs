//! # QuoteRepository
//!
//! 受け付けた見積もり依頼を `quotes` テーブルに保存するリポジトリ。
//! 保存の失敗は呼び出し元で記録され、通知処理は続行される。

use async_trait::async_trait;
use quotedesk_domain::submission::PersistedQuote;

use crate::{error::InfraError, rest::StorageClient};

/// 見積もり依頼リポジトリトレイト
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// 見積もり依頼を 1 件挿入する
    async fn insert(&self, quote: &PersistedQuote) -> Result<(), InfraError>;
}

/// REST 実装の QuoteRepository
#[derive(Clone)]
pub struct RestQuoteRepository {
    client: StorageClient,
}

impl RestQuoteRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QuoteRepository for RestQuoteRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(business_id = %quote.business_id))]
    async fn insert(&self, quote: &PersistedQuote) -> Result<(), InfraError> {
        self.client.insert("quotes", quote).await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use httpmock::prelude::*;
    use quotedesk_domain::tenant::TenantId;

    use super::*;
    use crate::error::InfraErrorKind;

    fn quote() -> PersistedQuote {
        PersistedQuote {
            business_id: TenantId::from_str("dd466cdb-7d43-4230-9a98-0fb6fbb700e8").unwrap(),
            name:        "Jane Doe".to_string(),
            email:       "jane@example.com".to_string(),
            phone:       "Not provided".to_string(),
            company:     "Acme".to_string(),
            service:     "Commercial Construction".to_string(),
            budget:      "Not specified".to_string(),
            timeline:    "Still Planning".to_string(),
            message:     "Office build-out".to_string(),
        }
    }

    #[tokio::test]
    async fn test_見積もり依頼がjsonで送信される() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rest/v1/quotes")
                    .header("prefer", "return=minimal")
                    .json_body(serde_json::json!({
                        "business_id": "dd466cdb-7d43-4230-9a98-0fb6fbb700e8",
                        "name": "Jane Doe",
                        "email": "jane@example.com",
                        "phone": "Not provided",
                        "company": "Acme",
                        "service": "Commercial Construction",
                        "budget": "Not specified",
                        "timeline": "Still Planning",
                        "message": "Office build-out",
                    }));
                then.status(201);
            })
            .await;
        let repository = RestQuoteRepository::new(StorageClient::new(
            &server.base_url(),
            "key",
            reqwest::Client::new(),
        ));

        repository.insert(&quote()).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_拒否された場合はエラーを返す() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/rest/v1/quotes");
                then.status(400).body("violates check constraint");
            })
            .await;
        let repository = RestQuoteRepository::new(StorageClient::new(
            &server.base_url(),
            "key",
            reqwest::Client::new(),
        ));

        let err = repository.insert(&quote()).await.unwrap_err();

        assert!(matches!(
            err.kind(),
            InfraErrorKind::UnexpectedStatus { status: 400, .. }
        ));
    }
}
