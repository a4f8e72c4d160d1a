//! # 見積もり依頼の受付データ
//!
//! 公開フォームから届いた信頼できない入力を、上限長で切り詰めた
//! サニタイズ済みの [`Submission`] に変換する。
//!
//! ## サニタイズ規則
//!
//! | フィールド | 上限（文字数） | 必須 | 未入力時の表示 |
//! |---|---|---|---|
//! | name | 100 | ○ | - |
//! | email | 254 | ○（形式検証あり） | - |
//! | phone | 30 | | `Not provided` |
//! | company | 200 | | `Not provided` |
//! | service / budget / timeline | 50 | | `Not specified` |
//! | message | 5000 | ○ | - |
//!
//! - 1 行フィールドは制御文字（CR / LF を含む）をすべて除去する。
//!   メールヘッダーへの行注入を防ぐため
//! - message はヘッダーに入らないため改行とタブを残し、CRLF を LF に揃える
//! - HTML エスケープはここでは行わない。リッチテキストへの埋め込み時に
//!   テンプレート側で自動エスケープされる

use chrono::{DateTime, Utc};
use serde::Serialize;
use validator::ValidateEmail;

use crate::{
    catalog::{self, BudgetRange, ServiceType, Timeline},
    error::ValidationErrors,
    tenant::TenantId,
};

pub const NAME_MAX_LENGTH: usize = 100;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const PHONE_MAX_LENGTH: usize = 30;
pub const COMPANY_MAX_LENGTH: usize = 200;
pub const CODE_MAX_LENGTH: usize = 50;
pub const MESSAGE_MAX_LENGTH: usize = 5000;

/// スタッフ向け通知に載せる本文プレビューの長さ
pub const PREVIEW_LENGTH: usize = 200;

/// 任意項目が未入力のときの表示
pub const NOT_PROVIDED: &str = "Not provided";

pub const NAME_REQUIRED: &str = "Name is required";
pub const EMAIL_REQUIRED: &str = "Valid email is required";
pub const MESSAGE_REQUIRED: &str = "Project details are required";

/// フォームから受け取った未加工の入力
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSubmission {
    pub name:     Option<String>,
    pub email:    Option<String>,
    pub phone:    Option<String>,
    pub company:  Option<String>,
    pub service:  Option<String>,
    pub budget:   Option<String>,
    pub timeline: Option<String>,
    pub message:  Option<String>,
}

/// サニタイズ・検証済みの見積もり依頼
///
/// 構築後は変更できない。すべての文字列は上限長以内で、
/// 任意項目は空なら `None` に正規化されている。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    name:         String,
    email:        String,
    phone:        Option<String>,
    company:      Option<String>,
    service:      Option<String>,
    budget:       Option<String>,
    timeline:     Option<String>,
    message:      String,
    submitted_at: DateTime<Utc>,
}

impl Submission {
    /// 未加工の入力をサニタイズし、必須項目を検証する
    ///
    /// 違反はすべて収集され、name → email → message の順で返される。
    pub fn parse(raw: RawSubmission, submitted_at: DateTime<Utc>) -> Result<Self, ValidationErrors> {
        let name = sanitize_line(raw.name.as_deref().unwrap_or_default(), NAME_MAX_LENGTH);
        let email = sanitize_line(raw.email.as_deref().unwrap_or_default(), EMAIL_MAX_LENGTH);
        let message = sanitize_multiline(
            raw.message.as_deref().unwrap_or_default(),
            MESSAGE_MAX_LENGTH,
        );

        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push(NAME_REQUIRED.to_string());
        }
        if !is_valid_email(&email) {
            errors.push(EMAIL_REQUIRED.to_string());
        }
        if message.is_empty() {
            errors.push(MESSAGE_REQUIRED.to_string());
        }
        if !errors.is_empty() {
            return Err(ValidationErrors::new(errors));
        }

        Ok(Self {
            name,
            email,
            phone: optional_line(raw.phone.as_deref(), PHONE_MAX_LENGTH),
            company: optional_line(raw.company.as_deref(), COMPANY_MAX_LENGTH),
            service: optional_line(raw.service.as_deref(), CODE_MAX_LENGTH),
            budget: optional_line(raw.budget.as_deref(), CODE_MAX_LENGTH),
            timeline: optional_line(raw.timeline.as_deref(), CODE_MAX_LENGTH),
            message,
            submitted_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn company(&self) -> Option<&str> {
        self.company.as_deref()
    }

    pub fn phone_display(&self) -> &str {
        self.phone().unwrap_or(NOT_PROVIDED)
    }

    pub fn company_display(&self) -> &str {
        self.company().unwrap_or(NOT_PROVIDED)
    }

    pub fn service_code(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn service_label(&self) -> String {
        catalog::label_for::<ServiceType>(self.service.as_deref().unwrap_or_default())
    }

    pub fn budget_label(&self) -> String {
        catalog::label_for::<BudgetRange>(self.budget.as_deref().unwrap_or_default())
    }

    pub fn timeline_label(&self) -> String {
        catalog::label_for::<Timeline>(self.timeline.as_deref().unwrap_or_default())
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// スタッフ向けの本文プレビュー
    pub fn message_preview(&self) -> String {
        preview(&self.message, PREVIEW_LENGTH)
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// ストレージに保存する形に変換する
    pub fn to_persisted(&self, business_id: &TenantId) -> PersistedQuote {
        PersistedQuote {
            business_id: business_id.clone(),
            name:        self.name.clone(),
            email:       self.email.clone(),
            phone:       self.phone_display().to_string(),
            company:     self.company_display().to_string(),
            service:     self.service_label(),
            budget:      self.budget_label(),
            timeline:    self.timeline_label(),
            message:     self.message.clone(),
        }
    }
}

/// ストレージの `quotes` に書き込むレコード
///
/// コード値ではなく表示ラベルを保存する。ダッシュボードがそのまま表示するため。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedQuote {
    pub business_id: TenantId,
    pub name:        String,
    pub email:       String,
    pub phone:       String,
    pub company:     String,
    pub service:     String,
    pub budget:      String,
    pub timeline:    String,
    pub message:     String,
}

/// 1 行フィールドのサニタイズ
///
/// 制御文字をすべて除去し、前後の空白を落としてから上限長で切り詰める。
pub fn sanitize_line(value: &str, max_chars: usize) -> String {
    let cleaned: String = value.chars().filter(|c| !c.is_control()).collect();
    truncate_chars(cleaned.trim(), max_chars)
}

/// 複数行フィールドのサニタイズ
///
/// 改行（LF）とタブ以外の制御文字を除去する。CRLF は LF に揃える。
pub fn sanitize_multiline(value: &str, max_chars: usize) -> String {
    let cleaned: String = value
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect();
    truncate_chars(cleaned.trim(), max_chars)
}

/// メールアドレスの形式を検証する
///
/// `validator` の判定に加え、ローカル部のドット規則（先頭・末尾のドット、
/// 連続するドットを禁止）を確認する。送信基盤はこれらを Reply-To に使えない。
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || !email.validate_email() {
        return false;
    }
    let Some((local, _domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.starts_with('"') {
        return true;
    }
    !(local.starts_with('.') || local.ends_with('.') || local.contains(".."))
}

/// 先頭から `limit` 文字を取り出し、切り詰めた場合は `...` を付ける
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

fn optional_line(value: Option<&str>, max_chars: usize) -> Option<String> {
    let sanitized = sanitize_line(value.unwrap_or_default(), max_chars);
    (!sanitized.is_empty()).then_some(sanitized)
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_string(),
        None => value.to_string(),
    }
}
