//! # 入力検証エラー
//!
//! フォーム入力の必須項目違反をまとめて表現する。
//!
//! 違反は 1 件ずつではなく、検出したものをすべて検出順に保持する。
//! 利用者が一度の送信で全項目を修正できるようにするため。

use thiserror::Error;

/// 入力検証エラー（違反メッセージの順序付きリスト）
///
/// `Display` は違反メッセージを `", "` で連結した文字列になる。
/// これはそのまま HTTP レスポンスの `message` として使われる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn new(errors: Vec<String>) -> Self {
        Self(errors)
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
