use crate::utils::keywords;

/// Minimum score a query-search candidate needs to be accepted.
pub const ACCEPT_THRESHOLD: f64 = 0.5;

/// Off-topic words that veto a candidate regardless of keyword overlap.
/// A word of the candidate text starting with an entry is a hit, which
/// covers plurals and hashtags like `#makeuphaul`.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    // weapons
    "gun", "rifle", "pistol", "shotgun", "ammo", "firearm", "weapon", "airsoft",
    // cosmetics / fashion retail
    "makeup", "lipstick", "mascara", "eyeliner", "skincare", "cosmetic",
    "haul", "unboxing", "outfit", "fashion", "grwm",
    // pranks and bait
    "prank", "asmr", "mukbang",
];

/// Keyword set derived from a user query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelevanceQuery {
    pub keywords: Vec<String>,
}

impl RelevanceQuery {
    pub fn new(query: &str) -> Self {
        RelevanceQuery {
            keywords: keywords(query),
        }
    }

    pub fn accepts(&self, title: &str, description: &str, channel: &str) -> bool {
        score(title, description, channel, &self.keywords) >= ACCEPT_THRESHOLD
    }
}

/// Fraction of `keywords` found in the combined candidate text, or 0.0 when
/// the text hits the negative-keyword blocklist.
pub fn score(title: &str, description: &str, channel: &str, keywords: &[String]) -> f64 {
    let blob = format!("{title} {description} {channel}").to_lowercase();

    let vetoed = blob
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .any(|word| NEGATIVE_KEYWORDS.iter().any(|neg| word.starts_with(*neg)));
    if vetoed {
        return 0.0;
    }

    if keywords.is_empty() {
        return 1.0;
    }

    let matched = keywords
        .iter()
        .filter(|k| blob.contains(k.to_lowercase().as_str()))
        .count();
    matched as f64 / keywords.len() as f64
}
