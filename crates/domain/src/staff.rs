//! # スタッフ通知対象
//!
//! 新しい見積もり依頼をスタッフへ知らせるときの宛先選定ルール。
//!
//! ## 選定ルール
//!
//! 1. テナントに所属するプロフィール、または管理者ロールのプロフィールが候補 `U`
//! 2. `notify_new_quote = false` の設定行を持つユーザーが除外集合 `O`
//! 3. 通知対象は `N = U − O`。設定行がないユーザーは通知する（オプトアウト方式）
//!
//! 集合演算は純粋関数 [`select_notify_set`] に閉じ込め、
//! 同じ入力に対して常に同じ集合を返す。

use std::collections::HashSet;

use serde::Deserialize;

define_uuid_id! {
    /// スタッフ（ダッシュボード利用者）の一意識別子
    ///
    /// ストレージ側の `profiles.id` および認証基盤のユーザー ID と一致する。
    pub struct UserId;
}

/// 挨拶文で名前がわからないときの呼びかけ
pub const UNKNOWN_RECIPIENT_NAME: &str = "there";

/// スタッフのプロフィール
///
/// `profiles?select=id,full_name` の 1 行に対応する。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaffProfile {
    #[serde(rename = "id")]
    pub user_id:   UserId,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl StaffProfile {
    /// 挨拶文に使う表示名（未設定なら `"there"`）
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_RECIPIENT_NAME)
    }
}

/// 通知設定の 1 行（`notification_preferences?select=user_id`）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreferenceRow {
    pub user_id: UserId,
}

/// メールアドレスまで解決済みの通知先スタッフ
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StaffRecipient {
    pub user_id:          UserId,
    pub display_name:     String,
    pub email:            String,
    pub notify_new_quote: bool,
}

impl StaffRecipient {
    /// 通知対象として選ばれたプロフィールとアドレスから宛先を作る
    pub fn new(profile: &StaffProfile, email: impl Into<String>) -> Self {
        Self {
            user_id:          profile.user_id.clone(),
            display_name:     profile.display_name().to_string(),
            email:            email.into(),
            notify_new_quote: true,
        }
    }
}

/// 候補プロフィールから明示的なオプトアウトを除いた通知対象を返す
///
/// 候補の並び順を保ち、同じユーザーが重複していれば最初の 1 件だけ残す。
pub fn select_notify_set(
    profiles: &[StaffProfile],
    opted_out: &HashSet<UserId>,
) -> Vec<StaffProfile> {
    let mut seen = HashSet::new();
    profiles
        .iter()
        .filter(|profile| !opted_out.contains(&profile.user_id))
        .filter(|profile| seen.insert(profile.user_id.clone()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;

    fn profile(n: u128, name: Option<&str>) -> StaffProfile {
        StaffProfile {
            user_id:   UserId::from_uuid(Uuid::from_u128(n)),
            full_name: name.map(str::to_string),
        }
    }

    fn ids(profiles: &[StaffProfile]) -> HashSet<UserId> {
        profiles.iter().map(|p| p.user_id.clone()).collect()
    }

    #[test]
    fn test_設定行がないスタッフは通知対象になる() {
        let profiles = vec![profile(1, Some("Ana")), profile(2, None)];

        let selected = select_notify_set(&profiles, &HashSet::new());

        assert_eq!(selected, profiles);
    }

    #[test]
    fn test_明示的にオプトアウトしたスタッフは除外される() {
        let profiles = vec![profile(1, Some("Ana")), profile(2, Some("Ben"))];
        let opted_out = HashSet::from([UserId::from_uuid(Uuid::from_u128(2))]);

        let selected = select_notify_set(&profiles, &opted_out);

        assert_eq!(selected, vec![profile(1, Some("Ana"))]);
    }

    #[test]
    fn test_候補に含まれないオプトアウトは影響しない() {
        let profiles = vec![profile(1, Some("Ana"))];
        let opted_out = HashSet::from([UserId::from_uuid(Uuid::from_u128(9))]);

        assert_eq!(select_notify_set(&profiles, &opted_out), profiles);
    }

    #[test]
    fn test_同じ入力からは同じ集合が得られる() {
        let profiles = vec![profile(3, None), profile(1, None), profile(2, None)];
        let opted_out = HashSet::from([UserId::from_uuid(Uuid::from_u128(1))]);

        let first = select_notify_set(&profiles, &opted_out);
        let second = select_notify_set(&profiles, &opted_out);

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_重複したプロフィールは1件にまとめられる() {
        let profiles = vec![profile(1, Some("Ana")), profile(1, Some("Ana"))];

        assert_eq!(select_notify_set(&profiles, &HashSet::new()).len(), 1);
    }

    #[test]
    fn test_名前が未設定なら呼びかけはthereになる() {
        assert_eq!(profile(1, None).display_name(), "there");
        assert_eq!(profile(1, Some("  ")).display_name(), "there");
        assert_eq!(profile(1, Some("Ana Lopez")).display_name(), "Ana Lopez");
    }

    #[test]
    fn test_プロフィール行はidとfull_nameからデシリアライズされる() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000001","full_name":null}"#;

        let parsed: StaffProfile = serde_json::from_str(json).unwrap();

        assert_eq!(parsed, profile(1, None));
    }
}
