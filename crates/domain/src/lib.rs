//! # QuoteDesk ドメイン層
//!
//! 見積もり依頼（quote request）の受付と通知配信の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **I/O を持たない**: ストレージ、メール送信、CAPTCHA 検証はすべてインフラ層の責務
//! - **不変な受付データ**: 一度構築した [`submission::Submission`] は変更できない
//! - **純粋な選定ロジック**: スタッフ通知対象の集合演算はここで完結させ、
//!   同じ入力に対して常に同じ結果を返す
//!
//! ## 依存関係の方向
//!
//! ```text
//! intake-service → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`audit`] - 外部呼び出しごとの監査ログエントリ
//! - [`catalog`] - サービス種別・予算・時期のコード表
//! - [`clock`] - テストで固定可能な時刻プロバイダ
//! - [`error`] - 入力検証エラー
//! - [`notification`] - メールメッセージ、通知先、配信結果
//! - [`staff`] - スタッフ通知対象の選定
//! - [`submission`] - 受付データのサニタイズと検証
//! - [`tenant`] - 単一テナント（事業者）
//!
//! ## 使用例
//!
//! ```rust
//! use chrono::Utc;
//! use quotedesk_domain::submission::{RawSubmission, Submission};
//!
//! let raw = RawSubmission {
//!     name: Some("Jane Doe".to_string()),
//!     email: Some("jane@example.com".to_string()),
//!     message: Some("New office build-out".to_string()),
//!     ..Default::default()
//! };
//!
//! let submission = Submission::parse(raw, Utc::now()).unwrap();
//! assert_eq!(submission.name(), "Jane Doe");
//! assert_eq!(submission.phone_display(), "Not provided");
//! ```

#[macro_use]
mod macros;

pub mod audit;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod notification;
pub mod staff;
pub mod submission;
pub mod tenant;

pub use error::ValidationErrors;
