//! # Intake Service ライブラリ
//!
//! Web サイトの見積もりフォームを受け付けるサービスのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーターとレイヤーの組み立て
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラー定義と HTTP レスポンスへの変換
//! - `handler`: HTTP ハンドラ
//! - `middleware`: ミドルウェア（クライアント IP の抽出）
//! - `usecase`: 受付パイプライン

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
