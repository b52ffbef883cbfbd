// src/model.rs
//! Plain data passed between the fetcher, the engine and the renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::TokenSet;

/// A fetched headline. Immutable once built by the fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub source_topic: String,
    /// Provider-side hint (feed position, priority); informational only.
    #[serde(default)]
    pub raw_score: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub weight: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub weight: u8,
}

/// Article plus everything the engine derived for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredArticle {
    #[serde(flatten)]
    pub article: Article,
    pub score: f64,
    pub is_trending: bool,
    pub identifier: String,
    pub matched_keywords: Vec<String>,
    #[serde(skip)]
    pub tokens: TokenSet,
}

/// One topic block of the digest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestSection {
    pub topic: Topic,
    pub articles: Vec<ScoredArticle>,
}

/// Ranked topic → articles structure handed to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Digest {
    pub sections: Vec<DigestSection>,
}

impl Digest {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn topic_count(&self) -> usize {
        self.sections.len()
    }

    pub fn article_count(&self) -> usize {
        self.sections.iter().map(|s| s.articles.len()).sum()
    }

    pub fn articles(&self) -> impl Iterator<Item = &ScoredArticle> {
        self.sections.iter().flat_map(|s| s.articles.iter())
    }
}

/// Stable identifier for history: short SHA-256 of the sorted normalized
/// title tokens, or of the link when the title carries no tokens.
pub fn article_identifier(tokens: &TokenSet, link: &str) -> String {
    use sha2::{Digest as _, Sha256};
    use std::fmt::Write as _;

    let mut hasher = Sha256::new();
    if tokens.is_empty() {
        hasher.update(b"link:");
        hasher.update(link.trim().as_bytes());
    } else {
        hasher.update(b"title:");
        for (i, t) in tokens.iter().enumerate() {
            if i > 0 {
                hasher.update(b" ");
            }
            hasher.update(t.as_bytes());
        }
    }
    let digest = hasher.finalize();
    let mut out = String::with_capacity(32);
    for b in digest.iter().take(16) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn identifier_ignores_casing_and_word_order_noise() {
        let a = article_identifier(&normalize("Fed RAISES rates"), "https://a");
        let b = article_identifier(&normalize("fed raises rates!"), "https://b");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn identifier_falls_back_to_link() {
        let e = TokenSet::new();
        let a = article_identifier(&e, "https://x/1");
        let b = article_identifier(&e, "https://x/2");
        assert_ne!(a, b);
    }
}
