//! # コード表
//!
//! フォームのセレクトボックスが送ってくるコード値と、メールや保存レコードに
//! 表示するラベルの対応表。
//!
//! ## 設計判断
//!
//! - **未知のコードは素通し**: フォーム側の選択肢が増えてもサーバーを更新せずに
//!   受け付けられるよう、対応表にないコードはそのまま表示する
//! - **未入力は "Not specified"**: 空文字と未送信を区別しない

use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoStaticStr};

/// 未入力時の表示ラベル
pub const NOT_SPECIFIED: &str = "Not specified";

/// コード表の 1 エントリ
pub trait CatalogEntry: FromStr + Copy {
    /// 表示ラベル
    fn label(self) -> &'static str;
}

/// コードを表示ラベルに変換する
///
/// - 空（または空白のみ）→ [`NOT_SPECIFIED`]
/// - 対応表にあるコード → ラベル
/// - それ以外 → コードそのもの
pub fn label_for<T: CatalogEntry>(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() {
        return NOT_SPECIFIED.to_string();
    }
    match T::from_str(code) {
        Ok(entry) => entry.label().to_string(),
        Err(_) => code.to_string(),
    }
}

/// サービス種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum ServiceType {
    #[strum(serialize = "commercial")]
    Commercial,
    #[strum(serialize = "residential")]
    Residential,
    #[strum(serialize = "renovation")]
    Renovation,
    #[strum(serialize = "design-build")]
    DesignBuild,
    #[strum(serialize = "management")]
    Management,
    #[strum(serialize = "preconstruction")]
    Preconstruction,
    #[strum(serialize = "other")]
    Other,
}

impl CatalogEntry for ServiceType {
    fn label(self) -> &'static str {
        match self {
            Self::Commercial => "Commercial Construction",
            Self::Residential => "Residential Construction",
            Self::Renovation => "Renovations & Remodeling",
            Self::DesignBuild => "Design-Build Services",
            Self::Management => "Project Management",
            Self::Preconstruction => "Pre-Construction Planning",
            Self::Other => "Other",
        }
    }
}

/// 予算帯
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum BudgetRange {
    #[strum(serialize = "under-100k")]
    Under100k,
    #[strum(serialize = "100k-500k")]
    From100kTo500k,
    #[strum(serialize = "500k-1m")]
    From500kTo1m,
    #[strum(serialize = "1m-5m")]
    From1mTo5m,
    #[strum(serialize = "over-5m")]
    Over5m,
}

impl CatalogEntry for BudgetRange {
    fn label(self) -> &'static str {
        match self {
            Self::Under100k => "Under $100,000",
            Self::From100kTo500k => "$100,000 - $500,000",
            Self::From500kTo1m => "$500,000 - $1,000,000",
            Self::From1mTo5m => "$1,000,000 - $5,000,000",
            Self::Over5m => "Over $5,000,000",
        }
    }
}

/// 着工時期
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum Timeline {
    #[strum(serialize = "immediate")]
    Immediate,
    #[strum(serialize = "1-3months")]
    OneToThreeMonths,
    #[strum(serialize = "3-6months")]
    ThreeToSixMonths,
    #[strum(serialize = "6-12months")]
    SixToTwelveMonths,
    #[strum(serialize = "planning")]
    Planning,
}

impl CatalogEntry for Timeline {
    fn label(self) -> &'static str {
        match self {
            Self::Immediate => "Immediate (Within 1 month)",
            Self::OneToThreeMonths => "1-3 Months",
            Self::ThreeToSixMonths => "3-6 Months",
            Self::SixToTwelveMonths => "6-12 Months",
            Self::Planning => "Still Planning",
        }
    }
}
