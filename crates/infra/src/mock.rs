//! # テスト用モック
//!
//! ユースケーステストと HTTP 統合テストで使用するインメモリ実装。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! quotedesk-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! すべてのモックは `Clone` で内部状態を共有する。テスト側でクローンを
//! 保持しておけば、ユースケースに渡した後も呼び出し記録を確認できる。

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use quotedesk_domain::{
    audit::AuditEntry,
    notification::{EmailMessage, NotificationError},
    staff::{StaffProfile, UserId},
    submission::PersistedQuote,
    tenant::{TenantContact, TenantId},
};

use crate::{
    captcha::{CaptchaError, CaptchaVerifier},
    error::InfraError,
    notification::NotificationSender,
    repository::{
        AuditLogRepository,
        IdentityRepository,
        QuoteRepository,
        StaffRepository,
        TenantRepository,
    },
};

// ===== MockNotificationSender =====

/// 送信したメールを記録する送信モック
///
/// `fail_for` で指定した宛先への送信だけを失敗させられる。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:          Arc<Mutex<Vec<EmailMessage>>>,
    attempts:      Arc<Mutex<Vec<EmailMessage>>>,
    failing:       Arc<Mutex<HashSet<String>>>,
    fail_all:      Arc<Mutex<bool>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定した宛先への送信を失敗させる
    pub fn fail_for(&self, to: &str) {
        self.failing.lock().unwrap().insert(to.to_string());
    }

    /// すべての送信を失敗させる
    pub fn fail_all(&self) {
        *self.fail_all.lock().unwrap() = true;
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// 成功・失敗を問わず送信を試みたメール
    pub fn attempted_emails(&self) -> Vec<EmailMessage> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        self.attempts.lock().unwrap().push(email.clone());

        let should_fail =
            *self.fail_all.lock().unwrap() || self.failing.lock().unwrap().contains(&email.to);
        if should_fail {
            return Err(NotificationError::SendFailed(format!(
                "SMTP Error: could not deliver to {}",
                email.to
            )));
        }

        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// ===== MockCaptchaVerifier =====

/// CAPTCHA 検証モックの応答
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockCaptchaResponse {
    Pass,
    Reject,
    Unavailable,
}

/// 応答を切り替えられる CAPTCHA 検証モック
#[derive(Clone)]
pub struct MockCaptchaVerifier {
    response: Arc<Mutex<MockCaptchaResponse>>,
    calls:    Arc<Mutex<Vec<(String, Option<String>)>>>,
}

impl Default for MockCaptchaVerifier {
    fn default() -> Self {
        Self::new(MockCaptchaResponse::Pass)
    }
}

impl MockCaptchaVerifier {
    pub fn new(response: MockCaptchaResponse) -> Self {
        Self {
            response: Arc::new(Mutex::new(response)),
            calls:    Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_response(&self, response: MockCaptchaResponse) {
        *self.response.lock().unwrap() = response;
    }

    /// 検証に渡された (トークン, クライアント IP) の記録
    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptchaVerifier for MockCaptchaVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        self.calls
            .lock()
            .unwrap()
            .push((token.to_string(), remote_ip.map(str::to_string)));

        let response = *self.response.lock().unwrap();
        match response {
            MockCaptchaResponse::Pass => Ok(()),
            MockCaptchaResponse::Reject => Err(CaptchaError::Rejected(vec![
                "invalid-input-response".to_string(),
            ])),
            MockCaptchaResponse::Unavailable => Err(CaptchaError::Request(InfraError::timeout(
                "captcha_verification",
            ))),
        }
    }
}

// ===== MockTenantRepository =====

#[derive(Clone, Default)]
pub struct MockTenantRepository {
    contact: Arc<Mutex<Option<TenantContact>>>,
    fail:    Arc<Mutex<bool>>,
}

impl MockTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_contact(&self, contact: TenantContact) {
        *self.contact.lock().unwrap() = Some(contact);
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }
}

#[async_trait]
impl TenantRepository for MockTenantRepository {
    async fn find_contact(&self, _tenant_id: &TenantId) -> Result<Option<TenantContact>, InfraError> {
        if *self.fail.lock().unwrap() {
            return Err(InfraError::unexpected_status(500, "businesses unavailable"));
        }
        Ok(self.contact.lock().unwrap().clone())
    }
}

// ===== MockQuoteRepository =====

#[derive(Clone, Default)]
pub struct MockQuoteRepository {
    quotes: Arc<Mutex<Vec<PersistedQuote>>>,
    fail:   Arc<Mutex<bool>>,
}

impl MockQuoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn inserted(&self) -> Vec<PersistedQuote> {
        self.quotes.lock().unwrap().clone()
    }
}

#[async_trait]
impl QuoteRepository for MockQuoteRepository {
    async fn insert(&self, quote: &PersistedQuote) -> Result<(), InfraError> {
        if *self.fail.lock().unwrap() {
            return Err(InfraError::unexpected_status(400, "insert rejected"));
        }
        self.quotes.lock().unwrap().push(quote.clone());
        Ok(())
    }
}

// ===== MockStaffRepository =====

/// プロフィールと通知設定のスナップショットを保持するスタッフリポジトリモック
#[derive(Clone, Default)]
pub struct MockStaffRepository {
    profiles:         Arc<Mutex<Vec<StaffProfile>>>,
    preferences:      Arc<Mutex<HashMap<UserId, bool>>>,
    fail_profiles:    Arc<Mutex<bool>>,
    fail_preferences: Arc<Mutex<HashSet<bool>>>,
    preference_calls: Arc<Mutex<Vec<bool>>>,
}

impl MockStaffRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, profile: StaffProfile) {
        self.profiles.lock().unwrap().push(profile);
    }

    /// 通知設定行を追加する
    pub fn set_preference(&self, user_id: UserId, notify_new_quote: bool) {
        self.preferences
            .lock()
            .unwrap()
            .insert(user_id, notify_new_quote);
    }

    pub fn fail_profiles(&self) {
        *self.fail_profiles.lock().unwrap() = true;
    }

    /// 指定した値の通知設定の問い合わせを失敗させる
    pub fn fail_preferences(&self, notify_new_quote: bool) {
        self.fail_preferences
            .lock()
            .unwrap()
            .insert(notify_new_quote);
    }

    /// 通知設定の問い合わせ順（問い合わせた `notify_new_quote` の値）
    pub fn preference_calls(&self) -> Vec<bool> {
        self.preference_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StaffRepository for MockStaffRepository {
    async fn find_candidates(&self, _tenant_id: &TenantId) -> Result<Vec<StaffProfile>, InfraError> {
        if *self.fail_profiles.lock().unwrap() {
            return Err(InfraError::timeout("profiles_query"));
        }
        Ok(self.profiles.lock().unwrap().clone())
    }

    async fn find_preference_user_ids(
        &self,
        user_ids: &[UserId],
        notify_new_quote: bool,
    ) -> Result<Vec<UserId>, InfraError> {
        self.preference_calls.lock().unwrap().push(notify_new_quote);
        if self
            .fail_preferences
            .lock()
            .unwrap()
            .contains(&notify_new_quote)
        {
            return Err(InfraError::unexpected_status(503, "preferences unavailable"));
        }

        let preferences = self.preferences.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter(|id| preferences.get(*id) == Some(&notify_new_quote))
            .cloned()
            .collect())
    }
}

// ===== MockIdentityRepository =====

#[derive(Clone, Default)]
pub struct MockIdentityRepository {
    emails:  Arc<Mutex<HashMap<UserId, String>>>,
    failing: Arc<Mutex<HashSet<UserId>>>,
}

impl MockIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_email(&self, user_id: UserId, email: &str) {
        self.emails
            .lock()
            .unwrap()
            .insert(user_id, email.to_string());
    }

    pub fn fail_for(&self, user_id: UserId) {
        self.failing.lock().unwrap().insert(user_id);
    }
}

#[async_trait]
impl IdentityRepository for MockIdentityRepository {
    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, InfraError> {
        if self.failing.lock().unwrap().contains(user_id) {
            return Err(InfraError::unexpected_status(404, "User not found"));
        }
        Ok(self.emails.lock().unwrap().get(user_id).cloned())
    }
}

// ===== MockAuditLogRepository =====

#[derive(Clone, Default)]
pub struct MockAuditLogRepository {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
    fail:    Arc<Mutex<bool>>,
}

impl MockAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追記を失敗させる（エントリは記録されない）
    pub fn fail(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditLogRepository for MockAuditLogRepository {
    async fn append(&self, entry: &AuditEntry) -> Result<(), InfraError> {
        if *self.fail.lock().unwrap() {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into());
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}
