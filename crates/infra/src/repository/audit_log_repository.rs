//! # AuditLogRepository
//!
//! 外部呼び出しの監査ログを追記するリポジトリ。
//!
//! ## 設計方針
//!
//! - **追記専用**: 1 エントリを 1 行としてファイル末尾に書き込む
//! - **プロセス内で直列化**: 並行する送信タスクの行が混ざらないよう、
//!   書き込みは非同期 Mutex で 1 本ずつ行う

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use quotedesk_domain::audit::AuditEntry;
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

use crate::error::InfraError;

/// 監査ログリポジトリトレイト
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// エントリを 1 件追記する
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError>;
}

/// ファイル追記による AuditLogRepository
#[derive(Clone)]
pub struct FileAuditLogRepository {
    path:  PathBuf,
    write: Arc<Mutex<()>>,
}

impl FileAuditLogRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:  path.into(),
            write: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl AuditLogRepository for FileAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError> {
        let line = format!("{entry}\n");

        let _guard = self.write.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use quotedesk_domain::{
        audit::{AuditOperation, AuditOutcome},
        notification::DeliveryChannel,
    };

    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("quote-requests-{}.log", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_エントリが1行ずつ追記される() {
        let path = temp_path();
        let repository = FileAuditLogRepository::new(&path);
        let occurred_at = Utc.with_ymd_and_hms(2025, 6, 2, 14, 5, 0).unwrap();

        repository
            .append(&AuditEntry::new(
                occurred_at,
                AuditOperation::QuoteInsert,
                "tenant",
                AuditOutcome::Success,
            ))
            .await
            .unwrap();
        repository
            .append(&AuditEntry::new(
                occurred_at,
                AuditOperation::Delivery(DeliveryChannel::Primary),
                "owner@example.com",
                AuditOutcome::Failure("timeout".to_string()),
            ))
            .await
            .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();
        assert_eq!(
            contents,
            "[2025-06-02T14:05:00+00:00] quote_insert target=tenant result=success\n\
             [2025-06-02T14:05:00+00:00] primary target=owner@example.com result=failure error=\"timeout\"\n"
        );
    }

    #[tokio::test]
    async fn test_書き込めないパスではエラーを返す() {
        let path = std::env::temp_dir()
            .join(format!("missing-{}", uuid::Uuid::new_v4()))
            .join("quote-requests.log");
        let repository = FileAuditLogRepository::new(path);

        let entry = AuditEntry::new(
            Utc::now(),
            AuditOperation::TenantLookup,
            "tenant",
            AuditOutcome::Success,
        );

        assert!(repository.append(&entry).await.is_err());
    }
}
