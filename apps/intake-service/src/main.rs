//! # Intake Service サーバー
//!
//! Web サイトの見積もりフォームを受け付け、事業者・スタッフ・依頼者へメールで通知する。
//!
//! ## 処理の流れ
//!
//! ```text
//! ┌──────────┐   POST /send-quote   ┌────────────────┐
//! │ Web site │─────────────────────→│ Intake Service │
//! └──────────┘                      └───────┬────────┘
//!                                           │
//!              ┌──────────────┬─────────────┼──────────────┐
//!              ↓              ↓             ↓              ↓
//!        ┌───────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐
//!        │ Turnstile │  │ Storage  │  │   SMTP   │  │ Audit log  │
//!        └───────────┘  └──────────┘  └──────────┘  └────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `INTAKE_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `INTAKE_PORT` | No | ポート番号（デフォルト: `8080`） |
//! | `SMTP_FROM_EMAIL` | **Yes** | 認証済み送信元アドレス |
//! | `NOTIFY_TO_EMAIL` | **Yes** | 一次通知の既定の宛先 |
//! | `TURNSTILE_SECRET` | **Yes** | Turnstile のシークレットキー |
//! | `STORAGE_URL` | **Yes** | ストレージのベース URL |
//! | `STORAGE_SERVICE_KEY` | **Yes** | ストレージのサービスキー |
//!
//! その他の変数は [`config`](quotedesk_intake_service::config) を参照。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（メールは送信せずログに出す）
//! NOTIFICATION_BACKEND=noop cargo run -p quotedesk-intake-service
//!
//! # 本番環境
//! LOG_FORMAT=json cargo run -p quotedesk-intake-service --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use quotedesk_domain::clock::SystemClock;
use quotedesk_infra::{
    captcha::TurnstileVerifier,
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    repository::{
        FileAuditLogRepository,
        RestIdentityRepository,
        RestQuoteRepository,
        RestStaffRepository,
        RestTenantRepository,
    },
    rest::{StorageClient, build_http_client},
};
use quotedesk_intake_service::{
    app_builder::build_router,
    config::{IntakeConfig, NotificationBackend},
    handler::QuoteState,
    usecase::{
        AuditLogger,
        NotificationService,
        QuoteIntakeUseCase,
        RecipientResolver,
        TemplateRenderer,
        TenantResolver,
    },
};
use quotedesk_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Intake Service サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    init_tracing(TracingConfig::from_env("intake-service"));

    // 設定読み込み
    let config = IntakeConfig::from_env()?;

    tracing::info!(
        "Intake Service サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // 外部サービスのクライアント
    let http_client = build_http_client(config.external_timeout)?;
    let storage = StorageClient::new(
        &config.storage.url,
        config.storage.service_key.clone(),
        http_client.clone(),
    );
    let captcha = Arc::new(TurnstileVerifier::new(
        http_client,
        &config.captcha.verify_url,
        config.captcha.secret.clone(),
    ));

    let sender: Arc<dyn NotificationSender> = match config.notification.backend {
        NotificationBackend::Smtp => {
            tracing::info!(
                host = %config.notification.smtp.host,
                port = config.notification.smtp.port,
                "SMTP でメールを送信します"
            );
            Arc::new(SmtpNotificationSender::new(&config.notification.smtp)?)
        }
        NotificationBackend::Noop => {
            tracing::warn!("NOTIFICATION_BACKEND=noop のためメールは送信されません");
            Arc::new(NoopNotificationSender)
        }
    };

    // ユースケース組み立て
    let clock = Arc::new(SystemClock);
    let audit = AuditLogger::new(
        Arc::new(FileAuditLogRepository::new(&config.audit_log_path)),
        clock.clone(),
    );
    let fallback_phone = config.branding.business_phone.clone();
    let renderer = TemplateRenderer::new(config.branding.clone())?;

    let usecase = QuoteIntakeUseCase::new(
        captcha,
        Arc::new(RestQuoteRepository::new(storage.clone())),
        TenantResolver::new(
            Arc::new(RestTenantRepository::new(storage.clone())),
            config.tenant.clone(),
            audit.clone(),
        ),
        RecipientResolver::new(
            Arc::new(RestStaffRepository::new(storage.clone())),
            Arc::new(RestIdentityRepository::new(storage)),
            audit.clone(),
        ),
        NotificationService::new(sender, renderer, audit.clone(), config.external_timeout),
        audit,
        clock,
    );

    let state = Arc::new(QuoteState {
        usecase: Arc::new(usecase),
        fallback_phone,
    });

    // ルーター構築
    let app = build_router(state, &config.allowed_origins);

    // サーバー起動
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Intake Service サーバーが起動しました: {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
