use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// Topic of one proposal section.
///
/// `Other` is the single "could not classify" value. The legacy `unknown`
/// label is still accepted on input and maps onto it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    #[serde(rename = "課題")]
    Issue,
    #[serde(rename = "個人")]
    PersonalAction,
    #[serde(rename = "地域")]
    CommunityAction,
    #[serde(rename = "行政")]
    GovernmentRole,
    #[serde(rename = "効果")]
    Effect,
    #[serde(rename = "実現性")]
    Feasibility,
    #[serde(rename = "その他", alias = "unknown")]
    Other,
}

/// Keyword table in tie-break order. Keywords are stored already normalized.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Issue,
        &["課題", "問題", "もんだい", "かだい", "困って", "こまって"],
    ),
    (
        Category::PersonalAction,
        &["個人", "こじん", "自分", "じぶん", "私たち", "わたし"],
    ),
    (
        Category::CommunityAction,
        &["地域", "ちいき", "住民", "じゅうみん", "町内", "自治会"],
    ),
    (
        Category::GovernmentRole,
        &["行政", "ぎょうせい", "市役所", "役所", "自治体", "公共"],
    ),
    (Category::Effect, &["効果", "こうか", "メリット", "利益", "りえき"]),
    (
        Category::Feasibility,
        &["実現", "じつげん", "可能", "かのう", "実行", "じっこう"],
    ),
];

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Issue,
        Category::PersonalAction,
        Category::CommunityAction,
        Category::GovernmentRole,
        Category::Effect,
        Category::Feasibility,
        Category::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Issue => "課題",
            Category::PersonalAction => "個人",
            Category::CommunityAction => "地域",
            Category::GovernmentRole => "行政",
            Category::Effect => "効果",
            Category::Feasibility => "実現性",
            Category::Other => "その他",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Category::Issue => "issue",
            Category::PersonalAction => "personal",
            Category::CommunityAction => "community",
            Category::GovernmentRole => "government",
            Category::Effect => "effect",
            Category::Feasibility => "feasibility",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        if needle == "unknown" {
            return Ok(Category::Other);
        }
        Category::ALL
            .into_iter()
            .find(|category| category.label() == needle || category.slug() == needle)
            .ok_or_else(|| format!("unknown category label: {s}"))
    }
}

pub fn normalize_text(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Keyword vote over the normalized text. Ties go to the earlier table entry.
pub fn classify_section_content(text: &str) -> Category {
    let normalized = normalize_text(text);
    if normalized.trim().is_empty() {
        return Category::Other;
    }

    let mut best = Category::Other;
    let mut best_score = 0usize;
    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords
            .iter()
            .filter(|keyword| normalized.contains(*keyword))
            .count();
        if score > best_score {
            best = *category;
            best_score = score;
        }
    }
    best
}
