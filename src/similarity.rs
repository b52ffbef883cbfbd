// src/similarity.rs
//! Token-set similarity. Threshold-agnostic: callers decide what counts as
//! "similar enough" for trend detection, dedup and history matching.

use serde::{Deserialize, Serialize};

use crate::normalize::TokenSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine over binary term vectors: |A∩B| / sqrt(|A|·|B|).
    #[default]
    Cosine,
    /// Intersection over union.
    Jaccard,
    /// Szymkiewicz–Simpson: |A∩B| / min(|A|, |B|).
    Overlap,
}

impl SimilarityMetric {
    /// Score in [0, 1]; symmetric; 1.0 for identical non-empty sets and 0.0
    /// whenever either side is empty.
    pub fn similarity(self, a: &TokenSet, b: &TokenSet) -> f64 {
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let inter = a.intersection(b).count() as f64;
        let (na, nb) = (a.len() as f64, b.len() as f64);
        let s = match self {
            Self::Cosine => inter / (na * nb).sqrt(),
            Self::Jaccard => inter / (na + nb - inter),
            Self::Overlap => inter / na.min(nb),
        };
        s.clamp(0.0, 1.0)
    }
}

/// Similarity with the default metric.
pub fn similarity(a: &TokenSet, b: &TokenSet) -> f64 {
    SimilarityMetric::default().similarity(a, b)
}

/// Share of `part` found in `whole`: |A∩B| / |A|. Not symmetric.
pub fn containment(part: &TokenSet, whole: &TokenSet) -> f64 {
    if part.is_empty() {
        return 0.0;
    }
    part.intersection(whole).count() as f64 / part.len() as f64
}
