//! Two-phase duplicate filtering.
//!
//! 1. Cross-run: drop articles already delivered within the retention window
//!    (exact identifier, plus an optional fuzzy title match against recent
//!    history titles).
//! 2. Intra-batch: rank by score and keep an article only if it is not a
//!    near-duplicate of one already kept. The output is pairwise below the
//!    threshold, so running the pass again on its own output keeps everything.
//!
//! Neither phase touches the history store; recording delivered articles is
//! the caller's job once delivery succeeded.

use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;

use crate::config::TieBreak;
use crate::history::HistoryStore;
use crate::model::ScoredArticle;
use crate::normalize::{strip_publisher_suffix, Normalizer, TokenSet};
use crate::similarity::{containment, SimilarityMetric};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DedupParams {
    /// Articles at or above this similarity are near-duplicates.
    pub threshold: f64,
    pub metric: SimilarityMetric,
    /// Which of two equally scored duplicates survives.
    pub tie_break: TieBreak,
}

impl Default for DedupParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            metric: SimilarityMetric::default(),
            tie_break: TieBreak::Oldest,
        }
    }
}

/// Cross-run filter over a loaded history.
#[derive(Debug)]
pub struct HistoryFilter<'h> {
    history: &'h HistoryStore,
    now: DateTime<Utc>,
    retention: Duration,
    fuzzy: Option<(f64, Vec<TokenSet>)>,
}

impl<'h> HistoryFilter<'h> {
    pub fn new(history: &'h HistoryStore, now: DateTime<Utc>, retention: Duration) -> Self {
        Self {
            history,
            now,
            retention,
            fuzzy: None,
        }
    }

    /// Also reject headlines whose tokens are mostly (`>= threshold`) found in
    /// a recently delivered title.
    pub fn with_fuzzy_match(mut self, normalizer: &Normalizer, threshold: f64) -> Self {
        let titles = self
            .history
            .recent_titles(self.now, self.retention)
            .map(|t| normalizer.tokens(strip_publisher_suffix(t)))
            .filter(|t| !t.is_empty())
            .collect();
        self.fuzzy = Some((threshold, titles));
        self
    }

    pub fn is_seen(&self, identifier: &str, tokens: &TokenSet) -> bool {
        if self.history.is_recent(identifier, self.now, self.retention) {
            return true;
        }
        match &self.fuzzy {
            Some((threshold, titles)) if !tokens.is_empty() => titles
                .iter()
                .any(|past| containment(tokens, past) >= *threshold),
            _ => false,
        }
    }

    /// Returns the survivors and how many were rejected.
    pub fn apply(&self, articles: Vec<ScoredArticle>) -> (Vec<ScoredArticle>, usize) {
        let before = articles.len();
        let kept: Vec<ScoredArticle> = articles
            .into_iter()
            .filter(|a| !self.is_seen(&a.identifier, &a.tokens))
            .collect();
        let rejected = before - kept.len();
        (kept, rejected)
    }
}

/// Rank order used by the batch pass: score desc, then the tie-break on
/// `published_at`, then link and title so the order is total.
pub fn rank_order(a: &ScoredArticle, b: &ScoredArticle, tie_break: TieBreak) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| tie_break.order(&a.article.published_at, &b.article.published_at))
        .then_with(|| a.article.link.cmp(&b.article.link))
        .then_with(|| a.article.title.cmp(&b.article.title))
}

/// Intra-batch near-duplicate removal. Returns survivors in rank order and
/// how many were dropped.
pub fn dedup_batch(
    mut articles: Vec<ScoredArticle>,
    params: &DedupParams,
) -> (Vec<ScoredArticle>, usize) {
    articles.sort_by(|a, b| rank_order(a, b, params.tie_break));

    let before = articles.len();
    let mut kept: Vec<ScoredArticle> = Vec::with_capacity(before);
    for cand in articles {
        let dup = kept.iter().any(|k| {
            k.identifier == cand.identifier
                || params.metric.similarity(&k.tokens, &cand.tokens) >= params.threshold
        });
        if !dup {
            kept.push(cand);
        }
    }
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{article_identifier, Article};
    use crate::normalize::normalize;
    use chrono::TimeZone;

    fn sa(title: &str, score: f64, hour: u32) -> ScoredArticle {
        let tokens = normalize(title);
        ScoredArticle {
            article: Article {
                title: title.into(),
                link: format!("https://news.example/{}", title.len() + hour as usize),
                published_at: Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap(),
                source_topic: "Economy".into(),
                raw_score: 0.0,
            },
            score,
            is_trending: false,
            identifier: article_identifier(&tokens, title),
            matched_keywords: vec![],
            tokens,
        }
    }

    #[test]
    fn fed_headlines_collapse_to_higher_score() {
        let a = sa("Fed raises interest rates", 12.0, 8);
        let b = sa("Federal Reserve raises rates", 14.0, 9);
        let (kept, dropped) = dedup_batch(vec![a, b], &DedupParams::default());
        assert_eq!(dropped, 1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].article.title, "Federal Reserve raises rates");
    }

    #[test]
    fn equal_scores_keep_earlier_by_default() {
        let a = sa("Fed raises interest rates", 10.0, 9);
        let b = sa("Federal Reserve raises rates", 10.0, 7);
        let (kept, _) = dedup_batch(vec![a, b], &DedupParams::default());
        assert_eq!(kept[0].article.title, "Federal Reserve raises rates");

        let newest = DedupParams {
            tie_break: TieBreak::Newest,
            ..DedupParams::default()
        };
        let a = sa("Fed raises interest rates", 10.0, 9);
        let b = sa("Federal Reserve raises rates", 10.0, 7);
        let (kept, _) = dedup_batch(vec![a, b], &newest);
        assert_eq!(kept[0].article.title, "Fed raises interest rates");
    }

    #[test]
    fn unrelated_headlines_survive_and_pass_is_idempotent() {
        let items = vec![
            sa("Fed raises interest rates", 12.0, 8),
            sa("Federal Reserve raises rates", 11.0, 9),
            sa("Volcano erupts in Iceland", 9.0, 6),
            sa("Championship parade draws crowds", 7.0, 5),
        ];
        let (once, _) = dedup_batch(items, &DedupParams::default());
        assert_eq!(once.len(), 3);
        let (twice, dropped) = dedup_batch(once.clone(), &DedupParams::default());
        assert_eq!(dropped, 0);
        assert_eq!(twice, once);
    }

    #[test]
    fn history_filter_exact_and_fuzzy() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();
        let seen = sa("Volcano erupts in Iceland", 9.0, 6);
        let mut h = HistoryStore::new();
        h.record(
            seen.identifier.clone(),
            Some("Senate passes sweeping climate bill".into()),
            now - Duration::days(1),
        );

        let exact_only = HistoryFilter::new(&h, now, Duration::days(30));
        let reworded = sa("Climate bill passes Senate after marathon session", 5.0, 3);
        assert!(exact_only.is_seen(&seen.identifier, &seen.tokens));
        assert!(!exact_only.is_seen(&reworded.identifier, &reworded.tokens));

        let fuzzy = HistoryFilter::new(&h, now, Duration::days(30))
            .with_fuzzy_match(&Normalizer::new(), 0.4);
        assert!(fuzzy.is_seen(&reworded.identifier, &reworded.tokens));

        let (kept, rejected) = fuzzy.apply(vec![seen, reworded, sa("Tech stocks slide", 4.0, 2)]);
        assert_eq!(rejected, 2);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn stale_history_does_not_block() {
        let now = Utc.with_ymd_and_hms(2025, 5, 2, 0, 0, 0).unwrap();
        let a = sa("Volcano erupts in Iceland", 9.0, 6);
        let mut h = HistoryStore::new();
        h.record(a.identifier.clone(), None, now - Duration::days(40));
        let f = HistoryFilter::new(&h, now, Duration::days(30));
        assert!(!f.is_seen(&a.identifier, &a.tokens));
    }
}
