//! Market metadata and category inference from market tags.

use serde::{Deserialize, Serialize};

/// Tag attached to a market by the metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTag {
    pub id: String,
    pub label: String,
    pub slug: String,
}

/// Metadata describing the market a trade happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketMetadata {
    pub condition_id: String,
    pub title: String,
    pub slug: Option<String>,
    pub tags: Vec<MarketTag>,
    /// User-facing categories derived from `tags`, sorted and unique.
    pub categories: Vec<String>,
}

impl MarketMetadata {
    /// Build metadata and derive categories from the tags.
    pub fn new(
        condition_id: impl Into<String>,
        title: impl Into<String>,
        slug: Option<String>,
        tags: Vec<MarketTag>,
    ) -> Self {
        let categories = categories_for_tags(&tags);
        Self {
            condition_id: condition_id.into(),
            title: title.into(),
            slug,
            tags,
            categories,
        }
    }
}

/// Keyword table mapping categories to tag label/slug fragments.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Politics",
        &[
            "politics", "political", "election", "president", "congress", "senate", "democrat",
            "republican", "vote", "voting", "candidate", "campaign",
        ],
    ),
    (
        "Sports",
        &[
            "sports", "sport", "football", "basketball", "baseball", "soccer", "nfl", "nba", "mlb",
            "nhl", "olympics", "championship", "tournament",
        ],
    ),
    (
        "Crypto",
        &[
            "crypto", "bitcoin", "ethereum", "btc", "eth", "blockchain", "defi", "nft", "web3",
            "token",
        ],
    ),
    (
        "Finance",
        &[
            "finance", "financial", "stock", "trading", "investment", "bank", "federal reserve",
            "fed",
        ],
    ),
    (
        "Geopolitics",
        &[
            "geopolitics", "geopolitical", "war", "conflict", "diplomacy", "foreign policy",
            "military", "nato", "united nations",
        ],
    ),
    (
        "Earnings",
        &["earnings", "quarterly", "revenue", "profit", "earnings report"],
    ),
    (
        "Tech",
        &[
            "tech", "technology", "artificial intelligence", "software", "hardware", "startup",
        ],
    ),
    (
        "Culture",
        &[
            "culture", "entertainment", "movie", "television", "celebrity", "music", "art",
            "media", "film",
        ],
    ),
    ("World", &["world", "global", "international", "worldwide"]),
    (
        "Economy",
        &[
            "economy", "economic", "gdp", "inflation", "unemployment", "recession",
        ],
    ),
    ("Trump", &["trump"]),
    (
        "Elections",
        &["election", "elections", "midterm", "primary", "ballot"],
    ),
];

/// Infer categories for a single tag by keyword matching its label and slug.
#[must_use]
pub fn categories_for_tag(label: &str, slug: &str) -> Vec<&'static str> {
    let haystack = format!("{} {}", label.to_lowercase(), slug.to_lowercase());
    let words: Vec<&str> = haystack
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| {
            keywords.iter().any(|kw| {
                if kw.contains(' ') {
                    haystack.contains(kw)
                } else {
                    words.iter().any(|w| w == kw)
                }
            })
        })
        .map(|(category, _)| *category)
        .collect()
}

/// Union of the categories of every tag, sorted and de-duplicated.
#[must_use]
pub fn categories_for_tags(tags: &[MarketTag]) -> Vec<String> {
    let mut categories: Vec<String> = tags
        .iter()
        .flat_map(|t| categories_for_tag(&t.label, &t.slug))
        .map(str::to_string)
        .collect();
    categories.sort();
    categories.dedup();
    categories
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(label: &str, slug: &str) -> MarketTag {
        MarketTag {
            id: "1".into(),
            label: label.into(),
            slug: slug.into(),
        }
    }

    #[test]
    fn infers_from_label_and_slug() {
        assert_eq!(categories_for_tag("NBA", "nba"), vec!["Sports"]);
        assert_eq!(categories_for_tag("Bitcoin", "bitcoin"), vec!["Crypto"]);
        assert!(categories_for_tag("Trump", "trump").contains(&"Trump"));
    }

    #[test]
    fn matches_whole_words_only() {
        // "ethics" must not match the "eth" keyword.
        assert!(categories_for_tag("Ethics", "ethics").is_empty());
        assert_eq!(categories_for_tag("Federal Reserve", "fed-rates"), vec!["Finance"]);
    }

    #[test]
    fn metadata_collects_unique_sorted_categories() {
        let market = MarketMetadata::new(
            "0xcond",
            "Who wins the election?",
            Some("who-wins".into()),
            vec![
                tag("US Election", "us-election"),
                tag("Politics", "politics"),
                tag("Elections", "elections"),
            ],
        );
        assert_eq!(market.categories, vec!["Elections", "Politics"]);
    }

    #[test]
    fn unknown_tags_yield_no_categories() {
        let market = MarketMetadata::new("0xc", "Q", None, vec![tag("Misc", "misc")]);
        assert!(market.categories.is_empty());
    }
}
