//! # リポジトリ実装
//!
//! ユースケース層が使うリポジトリトレイトと、その具体的な実装を提供する。
//!
//! ## 設計方針
//!
//! - **ストレージ抽象化**: REST API（[`StorageClient`](crate::rest::StorageClient)）の
//!   URL やヘッダーをカプセル化する
//! - **テスタビリティ**: トレイト経由でモック可能な設計
//! - **読み取り専用の外部状態**: テナント・スタッフ・認証基盤は参照のみ。
//!   書き込むのは見積もり依頼と監査ログだけ

pub mod audit_log_repository;
pub mod identity_repository;
pub mod quote_repository;
pub mod staff_repository;
pub mod tenant_repository;

pub use audit_log_repository::{AuditLogRepository, FileAuditLogRepository};
pub use identity_repository::{IdentityRepository, RestIdentityRepository};
pub use quote_repository::{QuoteRepository, RestQuoteRepository};
pub use staff_repository::{RestStaffRepository, StaffRepository};
pub use tenant_repository::{RestTenantRepository, TenantRepository};
