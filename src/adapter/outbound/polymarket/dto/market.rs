//! Gamma API market records (`GET /markets?condition_ids=&include_tag=true`).

use serde::Deserialize;

use crate::domain::{MarketMetadata, MarketTag};

/// Tag ids arrive as either strings or integers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GammaTagId {
    Text(String),
    Number(i64),
}

impl GammaTagId {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GammaTag {
    pub id: Option<GammaTagId>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    pub condition_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<GammaTag>,
}

impl GammaMarket {
    /// Convert into domain metadata, deriving categories from the tags.
    #[must_use]
    pub fn into_metadata(self, condition_id: &str) -> MarketMetadata {
        let tags = self
            .tags
            .into_iter()
            .map(|tag| MarketTag {
                id: tag.id.map(GammaTagId::into_string).unwrap_or_default(),
                label: tag.label.unwrap_or_default(),
                slug: tag.slug.unwrap_or_default(),
            })
            .collect();

        MarketMetadata::new(
            self.condition_id.unwrap_or_else(|| condition_id.to_string()),
            self.question.unwrap_or_else(|| "Unknown Market".into()),
            self.slug,
            tags,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_market_with_mixed_tag_ids() {
        let json = r#"[{
            "conditionId": "0xabc",
            "question": "Will the Fed cut rates?",
            "slug": "fed-cut",
            "tags": [
                {"id": 2, "label": "Politics", "slug": "politics"},
                {"id": "120", "label": "Fed Rates", "slug": "fed-rates"}
            ]
        }]"#;

        let markets: Vec<GammaMarket> = serde_json::from_str(json).unwrap();
        let meta = markets.into_iter().next().unwrap().into_metadata("0xabc");

        assert_eq!(meta.title, "Will the Fed cut rates?");
        assert_eq!(meta.slug.as_deref(), Some("fed-cut"));
        assert_eq!(meta.tags[0].id, "2");
        assert_eq!(meta.tags[1].id, "120");
        assert!(meta.categories.contains(&"Politics".to_string()));
    }
}
