//! # Intake Service 設定
//!
//! 環境変数から見積もり受付サービスの設定を読み込む。
//!
//! すべての値から制御文字とゼロ幅文字を取り除き、前後の空白を落とす。
//! シークレットをエディタからコピーした際に混入する不可視文字への対策。

use std::{env, time::Duration};

use quotedesk_domain::tenant::{Tenant, TenantId};
use quotedesk_infra::{
    captcha::TURNSTILE_VERIFY_URL,
    notification::{SmtpSecurity, SmtpSettings},
};
use thiserror::Error;

use crate::usecase::notification::Branding;

const DEFAULT_TENANT_ID: &str = "dd466cdb-7d43-4230-9a98-0fb6fbb700e8";

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    /// 値の形式が不正
    #[error("{key} の値が不正です: {value}")]
    Invalid { key: &'static str, value: String },
}

/// 通知の送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    Smtp,
    Noop,
}

/// 見積もり受付サービスの設定
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// CORS で許可するオリジン
    pub allowed_origins: Vec<String>,
    /// 外部呼び出し 1 回あたりのタイムアウト
    pub external_timeout: Duration,
    /// 静的なテナント設定（ストレージから取得できなかった場合に使う）
    pub tenant: Tenant,
    /// メール本文に差し込む事業者情報
    pub branding: Branding,
    /// 通知設定
    pub notification: NotificationConfig,
    /// CAPTCHA 検証設定
    pub captcha: CaptchaConfig,
    /// ストレージ設定
    pub storage: StorageConfig,
    /// 監査ログの出力先
    pub audit_log_path: String,
}

/// 通知機能の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: SMTP サーバー経由で送信（既定）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub backend: NotificationBackend,
    pub smtp:    SmtpSettings,
}

/// CAPTCHA 検証の設定
#[derive(Debug, Clone)]
pub struct CaptchaConfig {
    pub secret:     String,
    pub verify_url: String,
}

/// ストレージ（REST API + 認証基盤）の設定
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub url:         String,
    pub service_key: String,
}

impl IntakeConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// `from_env` の実体。テストでは `HashMap` から値を渡す。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| clean(&v)).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));
        let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let external_timeout =
            Duration::from_secs(parse_number(get("EXTERNAL_TIMEOUT_SECS"), "EXTERNAL_TIMEOUT_SECS", 5)?);

        let tenant_id_raw = or_default("TENANT_ID", DEFAULT_TENANT_ID);
        let tenant_id: TenantId = tenant_id_raw.parse().map_err(|_| ConfigError::Invalid {
            key:   "TENANT_ID",
            value: tenant_id_raw.clone(),
        })?;

        let notify_to_email = required("NOTIFY_TO_EMAIL")?;
        let from_name = or_default("SMTP_FROM_NAME", "DC Metro Construction");

        let smtp = SmtpSettings {
            host: or_default("SMTP_HOST", "smtp.gmail.com"),
            port: parse_number(get("SMTP_PORT"), "SMTP_PORT", 587)?,
            security: parse_smtp_security(get("SMTP_SECURITY"))?,
            credentials: match (get("SMTP_USERNAME"), get("SMTP_PASSWORD")) {
                (Some(username), Some(password)) => Some((username, password)),
                _ => None,
            },
            from_address: required("SMTP_FROM_EMAIL")?,
            timeout: external_timeout,
        };

        let branding = Branding {
            business_phone:    or_default("BUSINESS_PHONE", "(202) 555-1234"),
            business_email:    get("BUSINESS_PUBLIC_EMAIL").unwrap_or_else(|| notify_to_email.clone()),
            tagline:           or_default("BUSINESS_TAGLINE", "Building Excellence in the DMV Area"),
            dashboard_url:     or_default("DASHBOARD_URL", "http://localhost:8888/dashboard/"),
            dashboard_name:    or_default("DASHBOARD_NAME", "IPW Dashboard"),
            alert_sender_name: or_default("ALERT_SENDER_NAME", "IPW Alert System"),
        };

        Ok(Self {
            host: or_default("INTAKE_HOST", "0.0.0.0"),
            port: parse_number(get("INTAKE_PORT"), "INTAKE_PORT", 8080)?,
            allowed_origins: parse_origins(&or_default("ALLOWED_ORIGINS", "http://localhost:8888")),
            external_timeout,
            tenant: Tenant::new(tenant_id, notify_to_email, from_name),
            branding,
            notification: NotificationConfig {
                backend: parse_backend(get("NOTIFICATION_BACKEND"))?,
                smtp,
            },
            captcha: CaptchaConfig {
                secret:     required("TURNSTILE_SECRET")?,
                verify_url: or_default("TURNSTILE_VERIFY_URL", TURNSTILE_VERIFY_URL),
            },
            storage: StorageConfig {
                url:         required("STORAGE_URL")?,
                service_key: required("STORAGE_SERVICE_KEY")?,
            },
            audit_log_path: or_default("AUDIT_LOG_PATH", "quote-requests.log"),
        })
    }
}

/// 不可視文字を取り除き、前後の空白を落とす
fn clean(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_number<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

fn parse_backend(value: Option<String>) -> Result<NotificationBackend, ConfigError> {
    match value.as_deref() {
        None | Some("smtp") => Ok(NotificationBackend::Smtp),
        Some("noop") => Ok(NotificationBackend::Noop),
        Some(other) => Err(ConfigError::Invalid {
            key:   "NOTIFICATION_BACKEND",
            value: other.to_string(),
        }),
    }
}

fn parse_smtp_security(value: Option<String>) -> Result<SmtpSecurity, ConfigError> {
    match value.as_deref() {
        None | Some("starttls") => Ok(SmtpSecurity::StartTls),
        Some("tls") => Ok(SmtpSecurity::Tls),
        Some("none") => Ok(SmtpSecurity::None),
        Some(other) => Err(ConfigError::Invalid {
            key:   "SMTP_SECURITY",
            value: other.to_string(),
        }),
    }
}
