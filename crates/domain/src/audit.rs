//! # 監査ログ
//!
//! 受付パイプラインが行った外部呼び出し 1 回ごとの記録。
//!
//! ## 設計方針
//!
//! - **不変性**: エントリは一度作成されたら変更されない
//! - **追記専用**: 1 エントリを 1 行のテキストとして追記する
//! - **パイプラインに影響しない**: 記録の失敗は呼び出し元に伝播させない（インフラ層の責務）
//!
//! ## 行フォーマット
//!
//! ```text
//! [2025-06-02T14:05:00+00:00] primary target=owner@example.com result=failure error="connection refused"
//! ```
//!
//! ## 操作名
//!
//! | バリアント | 文字列表現 |
//! |-----------|-----------|
//! | `CaptchaVerification` | `captcha_verification` |
//! | `TenantLookup` | `tenant_lookup` |
//! | `QuoteInsert` | `quote_insert` |
//! | `ProfilesQuery` | `profiles_query` |
//! | `OptInQuery` | `opt_in_query` |
//! | `OptOutQuery` | `opt_out_query` |
//! | `IdentityLookup` | `identity_lookup` |
//! | `Delivery(channel)` | チャネル名（`primary` など） |

use std::fmt;

use chrono::{DateTime, Utc};

use crate::notification::{DeliveryChannel, DeliveryOutcome};

/// 監査対象の外部呼び出し
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    CaptchaVerification,
    TenantLookup,
    QuoteInsert,
    ProfilesQuery,
    OptInQuery,
    OptOutQuery,
    IdentityLookup,
    Delivery(DeliveryChannel),
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CaptchaVerification => "captcha_verification",
            Self::TenantLookup => "tenant_lookup",
            Self::QuoteInsert => "quote_insert",
            Self::ProfilesQuery => "profiles_query",
            Self::OptInQuery => "opt_in_query",
            Self::OptOutQuery => "opt_out_query",
            Self::IdentityLookup => "identity_lookup",
            Self::Delivery(channel) => (*channel).into(),
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 監査ログの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure(String),
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl<E: fmt::Display> From<&Result<(), E>> for AuditOutcome {
    fn from(result: &Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(e) => Self::Failure(e.to_string()),
        }
    }
}

/// 監査ログエントリ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub occurred_at: DateTime<Utc>,
    pub operation:   AuditOperation,
    /// 呼び出し先（宛先アドレス、テナント ID、ユーザー ID など）
    pub target:      String,
    pub outcome:     AuditOutcome,
}

impl AuditEntry {
    pub fn new(
        occurred_at: DateTime<Utc>,
        operation: AuditOperation,
        target: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            occurred_at,
            operation,
            target: target.into(),
            outcome,
        }
    }

    /// 配信結果からエントリを作る
    pub fn from_delivery(occurred_at: DateTime<Utc>, outcome: &DeliveryOutcome) -> Self {
        let result = match &outcome.error {
            None if outcome.success => AuditOutcome::Success,
            None => AuditOutcome::Failure("unknown error".to_string()),
            Some(error) => AuditOutcome::Failure(error.clone()),
        };
        Self::new(
            occurred_at,
            AuditOperation::Delivery(outcome.channel),
            outcome.recipient.clone(),
            result,
        )
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} target={}",
            self.occurred_at.to_rfc3339(),
            self.operation,
            single_line(&self.target)
        )?;
        match &self.outcome {
            AuditOutcome::Success => write!(f, " result=success"),
            AuditOutcome::Failure(error) => {
                write!(f, " result=failure error=\"{}\"", single_line(error).replace('"', "'"))
            }
        }
    }
}

/// 1 エントリが複数行に分かれないよう改行を空白に置き換える
fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn occurred_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_成功エントリの行フォーマット() {
        let entry = AuditEntry::new(
            occurred_at(),
            AuditOperation::QuoteInsert,
            "dd466cdb-7d43-4230-9a98-0fb6fbb700e8",
            AuditOutcome::Success,
        );

        assert_eq!(
            entry.to_string(),
            "[2025-06-02T14:05:00+00:00] quote_insert target=dd466cdb-7d43-4230-9a98-0fb6fbb700e8 result=success"
        );
    }

    #[test]
    fn test_失敗エントリはエラー内容を含み1行に収まる() {
        let entry = AuditEntry::new(
            occurred_at(),
            AuditOperation::Delivery(DeliveryChannel::Primary),
            "owner@example.com",
            AuditOutcome::Failure("smtp said \"no\"\nbye".to_string()),
        );

        assert_eq!(
            entry.to_string(),
            "[2025-06-02T14:05:00+00:00] primary target=owner@example.com result=failure error=\"smtp said 'no' bye\""
        );
    }

    #[test]
    fn test_配信結果からエントリを作れる() {
        let outcome = DeliveryOutcome::failed(DeliveryChannel::Fanout, "ana@example.com", "timeout");

        let entry = AuditEntry::from_delivery(occurred_at(), &outcome);

        assert_eq!(entry.operation.as_str(), "fanout");
        assert_eq!(entry.target, "ana@example.com");
        assert_eq!(entry.outcome, AuditOutcome::Failure("timeout".to_string()));
    }

    #[test]
    fn test_result_から結果を変換できる() {
        let ok: Result<(), String> = Ok(());
        let err: Result<(), String> = Err("boom".to_string());

        assert!(AuditOutcome::from(&ok).is_success());
        assert_eq!(AuditOutcome::from(&err), AuditOutcome::Failure("boom".to_string()));
    }
}
