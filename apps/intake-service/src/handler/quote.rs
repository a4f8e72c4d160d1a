//! # 見積もり依頼ハンドラ
//!
//! Web サイトの見積もりフォームから送信された依頼を受け付ける。
//!
//! ## エンドポイント
//!
//! - `POST /send-quote` - 見積もり依頼の受付
//!   （`application/x-www-form-urlencoded` または `multipart/form-data`）
//! - `OPTIONS /send-quote` - CORS プリフライト
//! - それ以外のメソッド - 405
//!
//! 受付処理は `tokio::spawn` したタスクで実行する。クライアントが接続を切っても
//! 送信途中のメールや保存処理は中断されない。

use std::sync::Arc;

use axum::{
    Extension,
    Form,
    Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
};
use quotedesk_domain::submission::RawSubmission;
use quotedesk_shared::event_log::error;
use serde::Deserialize;

use crate::{
    error::{IntakeError, QuoteResponse},
    middleware::ClientIp,
    usecase::{QuoteIntakeInput, QuoteIntakeUseCase},
};

/// 見積もり API の共有状態
pub struct QuoteState {
    pub usecase:        Arc<QuoteIntakeUseCase>,
    /// 受付処理自体が異常終了したときに案内する電話番号
    pub fallback_phone: String,
}

/// 見積もりフォームの送信内容
///
/// 未送信の項目は `None`。空文字列の扱いはドメイン層の検証に任せる。
#[derive(Debug, Default, Deserialize)]
pub struct QuoteForm {
    pub name:          Option<String>,
    pub email:         Option<String>,
    pub phone:         Option<String>,
    pub company:       Option<String>,
    pub service:       Option<String>,
    pub budget:        Option<String>,
    pub timeline:      Option<String>,
    pub message:       Option<String>,
    #[serde(rename = "cf-turnstile-response")]
    pub captcha_token: Option<String>,
}

impl QuoteForm {
    /// multipart の 1 パートを対応する項目に詰める（未知の項目は無視する）
    fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "company" => &mut self.company,
            "service" => &mut self.service,
            "budget" => &mut self.budget,
            "timeline" => &mut self.timeline,
            "message" => &mut self.message,
            "cf-turnstile-response" => &mut self.captcha_token,
            _ => return,
        };
        *slot = Some(value);
    }

    /// リクエストボディをデコードする
    ///
    /// ブラウザの `FormData` は `multipart/form-data` で送られるため、
    /// `Content-Type` を見て URL エンコードと multipart を振り分ける。
    async fn from_body(request: Request) -> Result<Self, IntakeError> {
        if is_multipart(&request) {
            Self::from_multipart(request).await
        } else {
            let Form(form) = Form::<Self>::from_request(request, &())
                .await
                .map_err(|rejection| {
                    tracing::info!(rejection = %rejection, "フォームをデコードできない");
                    IntakeError::InvalidForm
                })?;
            Ok(form)
        }
    }

    async fn from_multipart(request: Request) -> Result<Self, IntakeError> {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(invalid_multipart)?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field.text().await.map_err(invalid_multipart)?;
            form.set_field(&name, value);
        }
        Ok(form)
    }

    fn into_input(self, client_ip: ClientIp) -> QuoteIntakeInput {
        QuoteIntakeInput {
            submission:    RawSubmission {
                name:     self.name,
                email:    self.email,
                phone:    self.phone,
                company:  self.company,
                service:  self.service,
                budget:   self.budget,
                timeline: self.timeline,
                message:  self.message,
            },
            captcha_token: self.captcha_token,
            client_ip:     client_ip.0,
        }
    }
}

/// 見積もり依頼を受け付ける
///
/// ## レスポンス
///
/// - 200: 事業者への一次通知に成功
/// - 400: 入力検証・CAPTCHA 検証の失敗、フォームのデコード失敗
/// - 500: 一次通知に失敗（電話番号を案内する）
pub async fn submit_quote(
    State(state): State<Arc<QuoteState>>,
    Extension(client_ip): Extension<ClientIp>,
    request: Request,
) -> Result<Json<QuoteResponse>, IntakeError> {
    let form = QuoteForm::from_body(request).await?;

    let input = form.into_input(client_ip);
    let usecase = state.usecase.clone();
    let task = tokio::spawn(async move { usecase.submit(input).await });

    match task.await {
        Ok(result) => result.map(|()| Json(QuoteResponse::accepted())),
        Err(e) => {
            tracing::error!(
                error.category = error::category::INFRASTRUCTURE,
                error.kind = error::kind::INTERNAL,
                error = %e,
                "受付処理のタスクが異常終了"
            );
            Err(IntakeError::Delivery {
                phone: state.fallback_phone.clone(),
            })
        }
    }
}

fn invalid_multipart(e: impl std::fmt::Display) -> IntakeError {
    tracing::info!(rejection = %e, "multipart フォームをデコードできない");
    IntakeError::InvalidForm
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("multipart/form-data"))
}

/// CORS プリフライト以外の OPTIONS に応答する
///
/// プリフライトは `CorsLayer` が先に応答する。
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST / OPTIONS 以外のメソッドを拒否する
pub async fn method_not_allowed() -> IntakeError {
    IntakeError::MethodNotAllowed
}
