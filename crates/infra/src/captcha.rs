//! # CAPTCHA 検証
//!
//! フォーム送信に付いてきた CAPTCHA トークンを外部の検証サービスに問い合わせる。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`CaptchaVerifier`] でテスト時にスタブへ差し替え可能
//! - **1 回だけ問い合わせる**: リトライはしない。タイムアウトは `reqwest::Client` 側で設定
//! - **拒否と通信失敗を区別する**: どちらも呼び出し元では同じ扱いだが、監査ログには別の内容を残す

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::error::InfraError;

/// Cloudflare Turnstile の検証エンドポイント
pub const TURNSTILE_VERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// CAPTCHA 検証エラー
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// 検証サービスがトークンを拒否した
    #[error("CAPTCHA 検証で拒否されました: {}", .0.join(","))]
    Rejected(Vec<String>),

    /// 検証サービスへの問い合わせに失敗した
    #[error("CAPTCHA 検証サービスへの問い合わせに失敗: {0}")]
    Request(#[from] InfraError),
}

/// CAPTCHA 検証トレイト
#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    /// トークンを検証する
    ///
    /// `remote_ip` は呼び出し元クライアントの IP（取得できなければ `None`）。
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError>;
}

/// siteverify のレスポンス
#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    success:     bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Cloudflare Turnstile による検証
pub struct TurnstileVerifier {
    client:     reqwest::Client,
    verify_url: String,
    secret:     String,
}

impl TurnstileVerifier {
    /// 新しい検証クライアントを作成する
    ///
    /// # 引数
    ///
    /// - `client`: タイムアウト設定済みの HTTP クライアント
    /// - `verify_url`: siteverify の URL（通常は [`TURNSTILE_VERIFY_URL`]）
    /// - `secret`: サイトのシークレットキー
    pub fn new(client: reqwest::Client, verify_url: &str, secret: impl Into<String>) -> Self {
        Self {
            client,
            verify_url: verify_url.to_string(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl CaptchaVerifier for TurnstileVerifier {
    async fn verify(&self, token: &str, remote_ip: Option<&str>) -> Result<(), CaptchaError> {
        let mut form = vec![("secret", self.secret.as_str()), ("response", token)];
        if let Some(ip) = remote_ip {
            form.push(("remoteip", ip));
        }

        let response = self
            .client
            .post(&self.verify_url)
            .form(&form)
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InfraError::unexpected_status(status.as_u16(), body).into());
        }

        let body = response
            .json::<SiteverifyResponse>()
            .await
            .map_err(InfraError::from)?;

        if body.success {
            Ok(())
        } else {
            Err(CaptchaError::Rejected(body.error_codes))
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn verifier(server: &MockServer) -> TurnstileVerifier {
        TurnstileVerifier::new(
            reqwest::Client::new(),
            &server.url("/turnstile/v0/siteverify"),
            "test-secret",
        )
    }

    #[tokio::test]
    async fn test_検証成功ならokを返す() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/turnstile/v0/siteverify")
                    .form_urlencoded_tuple("secret", "test-secret")
                    .form_urlencoded_tuple("response", "token-123")
                    .form_urlencoded_tuple("remoteip", "203.0.113.7");
                then.status(200)
                    .json_body(serde_json::json!({ "success": true, "error-codes": [] }));
            })
            .await;

        let result = verifier(&server).verify("token-123", Some("203.0.113.7")).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_検証サービスが拒否したらrejectedを返す() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/turnstile/v0/siteverify");
                then.status(200).json_body(serde_json::json!({
                    "success": false,
                    "error-codes": ["invalid-input-response"]
                }));
            })
            .await;

        let result = verifier(&server).verify("bad-token", None).await;

        assert!(matches!(
            result,
            Err(CaptchaError::Rejected(codes)) if codes == vec!["invalid-input-response"]
        ));
    }

    #[tokio::test]
    async fn test_5xxはリクエスト失敗として扱う() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/turnstile/v0/siteverify");
                then.status(502).body("bad gateway");
            })
            .await;

        let result = verifier(&server).verify("token", None).await;

        assert!(matches!(result, Err(CaptchaError::Request(_))));
    }

    #[tokio::test]
    async fn test_接続できなければリクエスト失敗として扱う() {
        let verifier = TurnstileVerifier::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9/siteverify",
            "secret",
        );

        let result = verifier.verify("token", None).await;

        assert!(matches!(result, Err(CaptchaError::Request(_))));
    }
}
