//! # Intake Service エラーハンドリング
//!
//! 受付エンドポイントのエラー定義と、axum レスポンスへの変換。
//!
//! レスポンスはすべて `{ success, message }` 形式の JSON。
//! 外部サービスの失敗理由はレスポンスに含めない（ログと監査ログにのみ残す）。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use quotedesk_domain::ValidationErrors;
use serde::Serialize;
use thiserror::Error;

pub const SUCCESS_MESSAGE: &str =
    "Thank you! Your quote request has been sent. We will contact you shortly.";
pub const VERIFICATION_REQUIRED_MESSAGE: &str = "Security verification required. Please try again.";
pub const VERIFICATION_FAILED_MESSAGE: &str = "Security verification failed. Please try again.";
pub const INVALID_FORM_MESSAGE: &str = "Invalid form submission";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// 受付処理で発生するエラー
///
/// `IntoResponse` を実装しているため、axum が自動的に HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum IntakeError {
    /// 入力値の検証エラー（400 Bad Request）
    #[error("{0}")]
    Validation(ValidationErrors),

    /// CAPTCHA トークンが送られていない（400 Bad Request）
    #[error("{VERIFICATION_REQUIRED_MESSAGE}")]
    VerificationRequired,

    /// CAPTCHA 検証に失敗した（400 Bad Request）
    #[error("{VERIFICATION_FAILED_MESSAGE}")]
    VerificationFailed,

    /// フォームをデコードできない（400 Bad Request）
    #[error("{INVALID_FORM_MESSAGE}")]
    InvalidForm,

    /// POST 以外のメソッド（405 Method Not Allowed）
    #[error("{METHOD_NOT_ALLOWED_MESSAGE}")]
    MethodNotAllowed,

    /// 事業者への一次通知に失敗した（500 Internal Server Error）
    ///
    /// 利用者には電話での連絡を案内する。
    #[error("Failed to send email. Please call us directly at {phone}.")]
    Delivery { phone: String },
}

/// 受付エンドポイントのレスポンス
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub success: bool,
    pub message: String,
    /// 検証エラーの一覧（検証エラー時のみ）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors:  Option<Vec<String>>,
}

impl QuoteResponse {
    pub fn accepted() -> Self {
        Self {
            success: true,
            message: SUCCESS_MESSAGE.to_string(),
            errors:  None,
        }
    }
}

impl IntakeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::VerificationRequired
            | Self::VerificationFailed
            | Self::InvalidForm => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Delivery { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let errors = match self {
            Self::Validation(errors) => Some(errors.into_messages()),
            _ => None,
        };

        let body = QuoteResponse {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_検証エラーはerrors配列付きの400になる() {
        let error = IntakeError::Validation(ValidationErrors::new(vec![
            "Name is required".to_string(),
            "Valid email is required".to_string(),
        ]));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "message": "Name is required, Valid email is required",
                "errors": ["Name is required", "Valid email is required"]
            })
        );
    }

    #[tokio::test]
    async fn test_一次通知失敗は電話番号を案内する500になる() {
        let error = IntakeError::Delivery {
            phone: "(202) 555-1234".to_string(),
        };

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "success": false,
                "message": "Failed to send email. Please call us directly at (202) 555-1234."
            })
        );
    }

    #[test]
    fn test_メソッド不許可は405になる() {
        assert_eq!(
            IntakeError::MethodNotAllowed.status_code(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
