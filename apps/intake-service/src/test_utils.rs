//! # テストユーティリティ
//!
//! モック一式で組み立てた受付ユースケースとルーターを提供する。
//! テスト側はモックのクローンを保持し、送信・保存・監査ログの記録を確認する。

use std::{sync::Arc, time::Duration};

use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use quotedesk_domain::{
    clock::FixedClock,
    tenant::{Tenant, TenantId},
};
use quotedesk_infra::mock::{
    MockAuditLogRepository,
    MockCaptchaVerifier,
    MockIdentityRepository,
    MockNotificationSender,
    MockQuoteRepository,
    MockStaffRepository,
    MockTenantRepository,
};

use crate::{
    app_builder::build_router,
    handler::QuoteState,
    usecase::{
        AuditLogger,
        Branding,
        NotificationService,
        QuoteIntakeUseCase,
        RecipientResolver,
        TemplateRenderer,
        TenantResolver,
    },
};

pub const TEST_TENANT_ID: &str = "dd466cdb-7d43-4230-9a98-0fb6fbb700e8";
pub const TEST_CONTACT_EMAIL: &str = "owner@dcmetro.example.com";
pub const TEST_BUSINESS_PHONE: &str = "(202) 555-1234";
pub const TEST_ALLOWED_ORIGIN: &str = "https://dcmetro.example.com";

/// テスト用の固定受付時刻（2025-06-02 14:05 UTC）
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 14, 5, 0).unwrap()
}

pub fn test_tenant() -> Tenant {
    Tenant::new(
        TEST_TENANT_ID.parse::<TenantId>().unwrap(),
        TEST_CONTACT_EMAIL,
        "DC Metro Construction",
    )
}

pub fn test_branding() -> Branding {
    Branding {
        business_phone:    TEST_BUSINESS_PHONE.to_string(),
        business_email:    "info@dcmetro.example.com".to_string(),
        tagline:           "Building Excellence in the DMV Area".to_string(),
        dashboard_url:     "https://dcmetro.example.com/dashboard/".to_string(),
        dashboard_name:    "IPW Dashboard".to_string(),
        alert_sender_name: "IPW Alert System".to_string(),
    }
}

/// モック一式
///
/// すべてのモックは内部状態を共有するため、ユースケースに渡した後も
/// このハーネス経由で記録を確認できる。
#[derive(Clone, Default)]
pub struct TestHarness {
    pub sender:   MockNotificationSender,
    pub captcha:  MockCaptchaVerifier,
    pub tenants:  MockTenantRepository,
    pub quotes:   MockQuoteRepository,
    pub staff:    MockStaffRepository,
    pub identity: MockIdentityRepository,
    pub audit:    MockAuditLogRepository,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// モックを差し込んだ受付ユースケースを作る
    pub fn usecase(&self) -> QuoteIntakeUseCase {
        let clock = Arc::new(FixedClock::new(test_now()));
        let audit = AuditLogger::new(Arc::new(self.audit.clone()), clock.clone());
        let renderer = TemplateRenderer::new(test_branding()).unwrap();

        QuoteIntakeUseCase::new(
            Arc::new(self.captcha.clone()),
            Arc::new(self.quotes.clone()),
            TenantResolver::new(Arc::new(self.tenants.clone()), test_tenant(), audit.clone()),
            RecipientResolver::new(
                Arc::new(self.staff.clone()),
                Arc::new(self.identity.clone()),
                audit.clone(),
            ),
            NotificationService::new(
                Arc::new(self.sender.clone()),
                renderer,
                audit.clone(),
                Duration::from_secs(5),
            ),
            audit,
            clock,
        )
    }

    /// モックを差し込んだルーターを作る
    pub fn router(&self) -> Router {
        let state = Arc::new(QuoteState {
            usecase:        Arc::new(self.usecase()),
            fallback_phone: TEST_BUSINESS_PHONE.to_string(),
        });
        build_router(state, &[TEST_ALLOWED_ORIGIN.to_string()])
    }

    /// 監査ログに記録された操作名（記録順）
    pub fn audited_operations(&self) -> Vec<&'static str> {
        self.audit
            .entries()
            .iter()
            .map(|entry| entry.operation.as_str())
            .collect()
    }
}
