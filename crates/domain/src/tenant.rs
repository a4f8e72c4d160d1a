//! # テナント
//!
//! 問い合わせフォームを所有する事業者（テナント）のモデル。
//!
//! ## 設計判断
//!
//! - **単一テナント**: テナント ID は設定で固定され、リクエストから受け取らない
//! - **読み取り専用**: テナント情報はストレージ側の `businesses` を参照するだけで、
//!   このサービスから書き込むことはない
//! - **静的設定へのフォールバック**: ストレージから連絡先を取得できなかった場合は
//!   起動時の設定値をそのまま使う
//!
//! ## 使用例
//!
//! ```rust
//! use quotedesk_domain::tenant::{Tenant, TenantContact, TenantId};
//! use uuid::Uuid;
//!
//! let defaults = Tenant::new(
//!     TenantId::from_uuid(Uuid::nil()),
//!     "owner@example.com",
//!     "DC Metro Construction",
//! );
//!
//! let tenant = defaults.with_contact(TenantContact {
//!     contact_email: "office@example.com".to_string(),
//!     name:          None,
//! });
//!
//! assert_eq!(tenant.contact_email(), "office@example.com");
//! assert_eq!(tenant.display_name(), "DC Metro Construction");
//! ```

use serde::Deserialize;

use crate::submission::{NAME_MAX_LENGTH, sanitize_line};

define_uuid_id! {
    /// テナント（事業者）の一意識別子
    ///
    /// ストレージ側の `businesses.id` と一致する。
    pub struct TenantId;
}

/// テナント
///
/// 一次通知の宛先と表示名を保持する。送信に使う認証済みメールアカウントは
/// ここには含めない（到達性のため送信元アドレスは常に固定）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    id:            TenantId,
    contact_email: String,
    display_name:  String,
}

/// ストレージから取得したテナント連絡先
///
/// `businesses?select=contact_email,name` の 1 行に対応する。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TenantContact {
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub name:          Option<String>,
}

impl Tenant {
    pub fn new(
        id: TenantId,
        contact_email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            contact_email: contact_email.into(),
            display_name: display_name.into(),
        }
    }

    pub fn id(&self) -> &TenantId {
        &self.id
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// ストレージの連絡先で宛先と表示名を上書きする
    ///
    /// `contact_email` が空の場合は「取得できなかった」とみなし、元の値を返す。
    /// `name` が空の場合は表示名だけ元の値を維持する。
    pub fn with_contact(self, contact: TenantContact) -> Self {
        let contact_email = contact.contact_email.trim();
        if contact_email.is_empty() {
            return self;
        }

        // 表示名は From ヘッダーと件名に入るため、フォーム入力と同じ規則でサニタイズする
        let display_name = contact
            .name
            .as_deref()
            .map(|name| sanitize_line(name, NAME_MAX_LENGTH))
            .filter(|name| !name.is_empty())
            .unwrap_or(self.display_name);

        Self {
            id: self.id,
            contact_email: contact_email.to_string(),
            display_name,
        }
    }

    /// 指定アドレスが一次通知の宛先と同じかどうか（大文字小文字を区別しない）
    pub fn is_contact_address(&self, email: &str) -> bool {
        self.contact_email.eq_ignore_ascii_case(email.trim())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;

    use super::*;

    fn defaults() -> Tenant {
        Tenant::new(
            TenantId::from_str("dd466cdb-7d43-4230-9a98-0fb6fbb700e8").unwrap(),
            "static@example.com",
            "DC Metro Construction",
        )
    }

    #[test]
    fn test_連絡先と名前の両方で上書きされる() {
        let tenant = defaults().with_contact(TenantContact {
            contact_email: "office@example.com".to_string(),
            name:          Some("Metro Builders".to_string()),
        });

        assert_eq!(tenant.contact_email(), "office@example.com");
        assert_eq!(tenant.display_name(), "Metro Builders");
    }

    #[test]
    fn test_空の連絡先では静的設定を維持する() {
        let tenant = defaults().with_contact(TenantContact {
            contact_email: "  ".to_string(),
            name:          Some("Ignored".to_string()),
        });

        assert_eq!(tenant, defaults());
    }

    #[test]
    fn test_名前が空なら表示名だけ維持する() {
        let tenant = defaults().with_contact(TenantContact {
            contact_email: "office@example.com".to_string(),
            name:          Some(String::new()),
        });

        assert_eq!(tenant.contact_email(), "office@example.com");
        assert_eq!(tenant.display_name(), "DC Metro Construction");
    }

    #[test]
    fn test_表示名の制御文字は除去される() {
        let tenant = defaults().with_contact(TenantContact {
            contact_email: "office@example.com".to_string(),
            name:          Some("DC Metro\r\nBcc: victim@example.com".to_string()),
        });

        assert_eq!(tenant.display_name(), "DC MetroBcc: victim@example.com");
    }

    #[test]
    fn test_制御文字だけの表示名は未設定として扱う() {
        let tenant = defaults().with_contact(TenantContact {
            contact_email: "office@example.com".to_string(),
            name:          Some("\t\r\n".to_string()),
        });

        assert_eq!(tenant.display_name(), "DC Metro Construction");
    }

    #[test]
    fn test_宛先アドレスの比較は大文字小文字を区別しない() {
        let tenant = defaults();

        assert!(tenant.is_contact_address("Static@Example.com"));
        assert!(!tenant.is_contact_address("other@example.com"));
    }

    #[test]
    fn test_テナントidは文字列表現でシリアライズされる() {
        let id = TenantId::from_str("dd466cdb-7d43-4230-9a98-0fb6fbb700e8").unwrap();
        let json = serde_json::to_value(&id).unwrap();

        assert_eq!(json, "dd466cdb-7d43-4230-9a98-0fb6fbb700e8");
        assert_eq!(id.to_string(), "dd466cdb-7d43-4230-9a98-0fb6fbb700e8");
    }
}
