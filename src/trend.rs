// src/trend.rs
//! Trend detection against the global top-headlines pool.
//!
//! The pool's "hot" cluster is the set of tokens that recur across several
//! top headlines (document frequency ≥ 2), capped to the most frequent
//! `top_tokens`. A topic is trending when one of its headlines is covered by
//! that cluster beyond the configured overlap threshold.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::normalize::TokenSet;
use crate::similarity::containment;

/// Pools smaller than this carry no trend signal.
pub const MIN_POOL_SIZE: usize = 2;
const MIN_DOC_FREQ: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct TrendDetector {
    overlap_threshold: f64,
    top_tokens: usize,
}

impl TrendDetector {
    pub fn new(overlap_threshold: f64, top_tokens: usize) -> Self {
        Self {
            overlap_threshold: overlap_threshold.clamp(0.0, 1.0),
            top_tokens: top_tokens.max(1),
        }
    }

    /// Most frequent recurring tokens of the pool. Empty when the pool has
    /// fewer than [`MIN_POOL_SIZE`] headlines.
    pub fn hot_tokens(&self, pool: &[TokenSet]) -> TokenSet {
        if pool.len() < MIN_POOL_SIZE {
            return TokenSet::new();
        }
        let mut df: HashMap<&str, usize> = HashMap::new();
        for headline in pool {
            for tok in headline {
                *df.entry(tok.as_str()).or_insert(0) += 1;
            }
        }
        let mut ranked: Vec<(&str, usize)> =
            df.into_iter().filter(|(_, n)| *n >= MIN_DOC_FREQ).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(self.top_tokens)
            .map(|(t, _)| t.to_string())
            .collect()
    }

    /// True when any headline's share of hot tokens exceeds the threshold.
    pub fn is_trending(&self, hot: &TokenSet, headlines: &[TokenSet]) -> bool {
        if hot.is_empty() {
            return false;
        }
        headlines
            .iter()
            .any(|h| containment(h, hot) > self.overlap_threshold)
    }

    /// Names of trending topics, given each topic's headline token sets.
    pub fn trending_topics(
        &self,
        pool: &[TokenSet],
        by_topic: &BTreeMap<String, Vec<TokenSet>>,
    ) -> BTreeSet<String> {
        let hot = self.hot_tokens(pool);
        by_topic
            .iter()
            .filter(|(_, headlines)| self.is_trending(&hot, headlines))
            .map(|(name, _)| name.clone())
            .collect()
    }
}
