//! Composite relevance scoring.
//!
//! `score = w_topic * topic.weight
//!        + w_keyword * Σ weight(matched keywords)
//!        + w_trend * (topic.weight if trending else 0)`
//!
//! All functions here are pure: same inputs, same score.

use crate::config::{Overrides, ScoreWeights};
use crate::model::{Keyword, Topic};
use crate::normalize::{Normalizer, TokenSet};
use crate::similarity::containment;

/// Share of a keyword's tokens that must appear in the title. For keywords
/// of up to three tokens this is a plain subset test.
pub const KEYWORD_MIN_OVERLAP: f64 = 0.75;

/// Keyword with its normalized token set computed once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedKeyword {
    pub keyword: Keyword,
    pub tokens: TokenSet,
}

pub fn prepare_keywords(normalizer: &Normalizer, keywords: &[Keyword]) -> Vec<PreparedKeyword> {
    keywords
        .iter()
        .map(|k| PreparedKeyword {
            keyword: k.clone(),
            tokens: normalizer.tokens(&k.text),
        })
        .collect()
}

pub fn keyword_matches(keyword: &TokenSet, title: &TokenSet) -> bool {
    !keyword.is_empty() && containment(keyword, title) >= KEYWORD_MIN_OVERLAP
}

pub fn matched_keywords<'a>(
    title: &'a TokenSet,
    keywords: &'a [PreparedKeyword],
) -> impl Iterator<Item = &'a PreparedKeyword> + 'a {
    keywords
        .iter()
        .filter(move |k| keyword_matches(&k.tokens, title))
}

pub fn score(
    title: &TokenSet,
    topic: &Topic,
    keywords: &[PreparedKeyword],
    is_trending: bool,
    w: &ScoreWeights,
) -> f64 {
    let topic_part = f64::from(w.topic) * f64::from(topic.weight);
    let keyword_sum: u32 = matched_keywords(title, keywords)
        .map(|k| u32::from(k.keyword.weight))
        .sum();
    let keyword_part = f64::from(w.keyword) * f64::from(keyword_sum);
    let trend_part = if is_trending {
        f64::from(w.trend) * f64::from(topic.weight)
    } else {
        0.0
    };
    topic_part + keyword_part + trend_part
}

/// Ban/demote rules, normalized once.
#[derive(Debug, Clone, Default)]
pub struct OverrideRules {
    banned: Vec<TokenSet>,
    demoted: Vec<TokenSet>,
    demote_factor: f64,
}

impl OverrideRules {
    pub fn from_config(normalizer: &Normalizer, o: &Overrides) -> Self {
        let prep = |terms: &[String]| -> Vec<TokenSet> {
            terms
                .iter()
                .map(|t| normalizer.tokens(t))
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            banned: prep(&o.banned),
            demoted: prep(&o.demoted),
            demote_factor: o.demote_factor.clamp(0.0, 1.0),
        }
    }

    fn any_term_in(terms: &[TokenSet], title: &TokenSet) -> bool {
        terms.iter().any(|t| t.is_subset(title))
    }

    pub fn is_banned(&self, title: &TokenSet) -> bool {
        Self::any_term_in(&self.banned, title)
    }

    pub fn is_demoted(&self, title: &TokenSet) -> bool {
        Self::any_term_in(&self.demoted, title)
    }

    /// Scales `score` by the demote factor once if any demoted term matches.
    pub fn adjust(&self, score: f64, title: &TokenSet) -> f64 {
        if self.is_demoted(title) {
            score * self.demote_factor
        } else {
            score
        }
    }
}
