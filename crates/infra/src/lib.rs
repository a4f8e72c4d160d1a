//! # QuoteDesk インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! 各モジュールはユースケース層から見たトレイト（送信、検証、リポジトリ）と、
//! その具体的な実装を提供する。外部システムの詳細をカプセル化し、
//! ユースケースをインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **メール送信**: SMTP（lettre）と Noop
//! - **CAPTCHA 検証**: Cloudflare Turnstile
//! - **ストレージ / 認証基盤**: REST API（reqwest）
//! - **監査ログ**: 追記専用のテキストファイル
//!
//! ## 依存関係
//!
//! ```text
//! intake-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`captcha`] - CAPTCHA 検証
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信
//! - [`repository`] - リポジトリ実装
//! - [`rest`] - ストレージ REST API クライアント
//! - `mock` - テスト用のインメモリ実装（`test-utils` feature）

pub mod captcha;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod repository;
pub mod rest;

pub use error::InfraError;
