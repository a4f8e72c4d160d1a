//! # TenantRepository
//!
//! テナント（事業者）の連絡先を取得するリポジトリ。

use async_trait::async_trait;
use quotedesk_domain::tenant::{TenantContact, TenantId};

use crate::{error::InfraError, rest::StorageClient};

/// テナントリポジトリトレイト
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// テナントの連絡先を取得する
    ///
    /// 該当行がなければ `None` を返す。
    async fn find_contact(&self, tenant_id: &TenantId) -> Result<Option<TenantContact>, InfraError>;
}

/// REST 実装の TenantRepository（`businesses` テーブル）
#[derive(Clone)]
pub struct RestTenantRepository {
    client: StorageClient,
}

impl RestTenantRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TenantRepository for RestTenantRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(%tenant_id))]
    async fn find_contact(&self, tenant_id: &TenantId) -> Result<Option<TenantContact>, InfraError> {
        let query = format!("id=eq.{tenant_id}&select=contact_email,name");
        let rows: Vec<TenantContact> = self.client.select("businesses", &query).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;

    use super::*;

    const TENANT: &str = "dd466cdb-7d43-4230-9a98-0fb6fbb700e8";

    fn repository(server: &MockServer) -> RestTenantRepository {
        RestTenantRepository::new(StorageClient::new(
            &server.base_url(),
            "key",
            reqwest::Client::new(),
        ))
    }

    #[tokio::test]
    async fn test_連絡先が取得できる() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/rest/v1/businesses")
                    .query_param("id", format!("eq.{TENANT}"))
                    .query_param("select", "contact_email,name");
                then.status(200).json_body(serde_json::json!([
                    { "contact_email": "office@example.com", "name": "Metro Builders" }
                ]));
            })
            .await;

        let contact = repository(&server)
            .find_contact(&TenantId::from_str(TENANT).unwrap())
            .await
            .unwrap();

        assert_eq!(
            contact,
            Some(TenantContact {
                contact_email: "office@example.com".to_string(),
                name:          Some("Metro Builders".to_string()),
            })
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_該当行がなければnoneを返す() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/rest/v1/businesses");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let contact = repository(&server)
            .find_contact(&TenantId::from_str(TENANT).unwrap())
            .await
            .unwrap();

        assert_eq!(contact, None);
    }
}
