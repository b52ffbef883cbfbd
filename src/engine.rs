//! # Digest Engine
//! Pure, testable pipeline for one run:
//! normalize → ban filter → trend → score → history filter → batch dedup →
//! select. No I/O; history comes in as a value and is handed back merged
//! only through [`DigestRun::commit`], after the caller delivered the digest.

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, gauge};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::DigestConfig;
use crate::dedup::{dedup_batch, DedupParams, HistoryFilter};
use crate::digest::{select, SelectionParams};
use crate::error::DigestError;
use crate::history::HistoryStore;
use crate::metrics as m;
use crate::model::{article_identifier, Article, Digest, ScoredArticle, Topic};
use crate::normalize::{strip_publisher_suffix, Normalizer, TokenSet};
use crate::scoring::{self, matched_keywords, prepare_keywords, OverrideRules, PreparedKeyword};
use crate::trend::TrendDetector;

/// Everything the fetcher hands over for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInput {
    /// Per-topic headlines; `source_topic` names the configured topic.
    pub headlines: Vec<Article>,
    /// Titles of the global top-headlines feed.
    #[serde(default)]
    pub top_headlines: Vec<String>,
}

impl RunInput {
    pub fn check(&self) -> Result<(), DigestError> {
        if self.headlines.is_empty() {
            Err(DigestError::EmptyInput)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub fetched: usize,
    pub unknown_topic: usize,
    pub banned: usize,
    pub seen_before: usize,
    pub duplicates: usize,
    pub below_min_score: usize,
    pub trending_topics: usize,
    pub selected_topics: usize,
    pub selected_articles: usize,
    pub empty_input: bool,
}

/// History entry scheduled for the post-delivery commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEntry {
    pub identifier: String,
    pub title: String,
}

/// How the caller disposed of a run's digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Digest sent.
    Sent,
    /// Nothing to send; history is still pruned.
    NothingToSend,
    /// Printed only. Nothing counts as seen.
    DryRun,
}

/// Result of one run. Holds the history it was given, untouched, until the
/// caller commits or abandons.
#[derive(Debug)]
pub struct DigestRun {
    pub digest: Digest,
    pub stats: RunStats,
    history: HistoryStore,
    pending: Vec<PendingEntry>,
    now: DateTime<Utc>,
    retention: Duration,
}

impl DigestRun {
    pub fn pending(&self) -> &[PendingEntry] {
        &self.pending
    }

    /// History as loaded at run start.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Merge delivered identifiers into history and prune stale entries.
    pub fn commit(self) -> HistoryStore {
        let mut history = self.history;
        for p in self.pending {
            history.record(p.identifier, Some(p.title), self.now);
        }
        let pruned = history.prune(self.now, self.retention);
        debug!(target: "digest", pruned, size = history.len(), "history committed");
        history
    }

    /// History to persist after `delivery`, or `None` when the stored file
    /// must stay as it is.
    pub fn settle(self, delivery: Delivery) -> Option<HistoryStore> {
        match delivery {
            Delivery::Sent | Delivery::NothingToSend => Some(self.commit()),
            Delivery::DryRun => {
                debug!(target: "digest", pending = self.pending.len(), "dry run, history untouched");
                None
            }
        }
    }

    /// Delivery failed: hand back the history unchanged.
    pub fn abandon(self) -> HistoryStore {
        self.history
    }
}

#[derive(Debug)]
pub struct DigestEngine {
    cfg: DigestConfig,
    normalizer: Normalizer,
    // without configured extra stopwords, so identifiers survive config edits
    id_normalizer: Normalizer,
    keywords: Vec<PreparedKeyword>,
    overrides: OverrideRules,
    trend: TrendDetector,
}

impl DigestEngine {
    /// Validates the configuration; a bad config never reaches scoring.
    pub fn new(cfg: DigestConfig) -> Result<Self, DigestError> {
        cfg.validate()?;
        let normalizer = Normalizer::new().with_extra_stopwords(&cfg.overrides.extra_stopwords);
        check_terms(&normalizer, &cfg)?;
        let keywords = prepare_keywords(&normalizer, &cfg.keywords);
        let overrides = OverrideRules::from_config(&normalizer, &cfg.overrides);
        let trend = TrendDetector::new(cfg.thresholds.trend_overlap, cfg.limits.trend_top_tokens);
        Ok(Self {
            cfg,
            normalizer,
            id_normalizer: Normalizer::new(),
            keywords,
            overrides,
            trend,
        })
    }

    pub fn config(&self) -> &DigestConfig {
        &self.cfg
    }

    /// History identifier of a headline. Independent of `extra_stopwords`.
    pub fn identifier(&self, title: &str, link: &str) -> String {
        article_identifier(&self.id_normalizer.tokens(strip_publisher_suffix(title)), link)
    }

    /// Tokens used for every comparison of a headline.
    pub fn headline_tokens(&self, title: &str) -> TokenSet {
        self.normalizer.tokens(strip_publisher_suffix(title))
    }

    /// Score one article against its topic. Pure.
    pub fn score_article(&self, tokens: &TokenSet, topic: &Topic, is_trending: bool) -> f64 {
        let base = scoring::score(tokens, topic, &self.keywords, is_trending, &self.cfg.weights);
        self.overrides.adjust(base, tokens)
    }

    pub fn run(&self, input: &RunInput, history: HistoryStore, now: DateTime<Utc>) -> DigestRun {
        m::ensure_described();
        let retention = self.cfg.retention();
        let mut stats = RunStats {
            fetched: input.headlines.len(),
            ..RunStats::default()
        };
        counter!(m::HEADLINES).increment(input.headlines.len() as u64);
        gauge!(m::LAST_RUN_TS).set(now.timestamp() as f64);

        if let Err(e) = input.check() {
            info!(target: "digest", reason = %e, "empty input, producing empty digest");
            stats.empty_input = true;
            return DigestRun {
                digest: Digest::default(),
                stats,
                history,
                pending: Vec::new(),
                now,
                retention,
            };
        }

        // (1) normalize, resolve topic, apply bans
        let mut prepared: Vec<(&Article, &Topic, TokenSet)> = Vec::with_capacity(input.headlines.len());
        for a in &input.headlines {
            let Some(topic) = self.cfg.topic(a.source_topic.trim()) else {
                stats.unknown_topic += 1;
                continue;
            };
            let tokens = self.headline_tokens(&a.title);
            if self.overrides.is_banned(&tokens) {
                stats.banned += 1;
                continue;
            }
            prepared.push((a, topic, tokens));
        }
        counter!(m::BANNED).increment(stats.banned as u64);

        // (2) trend per topic
        let pool: Vec<TokenSet> = input
            .top_headlines
            .iter()
            .map(|t| self.headline_tokens(t))
            .collect();
        let mut by_topic: BTreeMap<String, Vec<TokenSet>> = BTreeMap::new();
        for (_, topic, tokens) in &prepared {
            by_topic
                .entry(topic.name.clone())
                .or_default()
                .push(tokens.clone());
        }
        let trending = self.trend.trending_topics(&pool, &by_topic);
        stats.trending_topics = trending.len();
        gauge!(m::TRENDING).set(trending.len() as f64);

        // (3) score
        let scored: Vec<ScoredArticle> = prepared
            .into_iter()
            .map(|(a, topic, tokens)| {
                let is_trending = trending.contains(&topic.name);
                let score = self.score_article(&tokens, topic, is_trending);
                let matched = matched_keywords(&tokens, &self.keywords)
                    .map(|k| k.keyword.text.clone())
                    .collect();
                ScoredArticle {
                    article: Article {
                        source_topic: topic.name.clone(),
                        ..a.clone()
                    },
                    score,
                    is_trending,
                    identifier: self.identifier(&a.title, &a.link),
                    matched_keywords: matched,
                    tokens,
                }
            })
            .collect();

        // (4) cross-run
        let mut filter = HistoryFilter::new(&history, now, retention);
        if self.cfg.thresholds.fuzzy_history {
            filter = filter.with_fuzzy_match(&self.normalizer, self.cfg.thresholds.history_match);
        }
        let (fresh, seen_before) = filter.apply(scored);
        stats.seen_before = seen_before;
        counter!(m::SEEN_BEFORE).increment(seen_before as u64);

        // (5) intra-batch
        let dedup = DedupParams {
            threshold: self.cfg.thresholds.deduplication,
            metric: self.cfg.ordering.similarity,
            tie_break: self.cfg.ordering.dedup_tie_break,
        };
        let (unique, duplicates) = dedup_batch(fresh, &dedup);
        stats.duplicates = duplicates;
        counter!(m::DUPLICATES).increment(duplicates as u64);

        stats.below_min_score = unique
            .iter()
            .filter(|a| a.score < self.cfg.thresholds.min_article_score)
            .count();
        counter!(m::BELOW_FLOOR).increment(stats.below_min_score as u64);

        // (6) select
        let selection = SelectionParams {
            min_article_score: self.cfg.thresholds.min_article_score,
            max_topics: self.cfg.limits.max_topics,
            max_articles_per_topic: self.cfg.limits.max_articles_per_topic,
            tie_break: self.cfg.ordering.selection_tie_break,
        };
        let digest = select(unique, &self.cfg.topics, &selection);
        stats.selected_topics = digest.topic_count();
        stats.selected_articles = digest.article_count();
        counter!(m::DELIVERED).increment(stats.selected_articles as u64);

        let pending = digest
            .articles()
            .map(|a| PendingEntry {
                identifier: a.identifier.clone(),
                title: a.article.title.clone(),
            })
            .collect();

        info!(
            target: "digest",
            fetched = stats.fetched,
            banned = stats.banned,
            seen_before = stats.seen_before,
            duplicates = stats.duplicates,
            trending = stats.trending_topics,
            topics = stats.selected_topics,
            articles = stats.selected_articles,
            "digest assembled"
        );

        DigestRun {
            digest,
            stats,
            history,
            pending,
            now,
            retention,
        }
    }
}

/// A keyword or override term made only of stopwords could never match.
fn check_terms(normalizer: &Normalizer, cfg: &DigestConfig) -> Result<(), DigestError> {
    let terms = cfg
        .keywords
        .iter()
        .map(|k| ("keywords.text", k.text.as_str()))
        .chain(cfg.overrides.banned.iter().map(|t| ("overrides.banned", t.as_str())))
        .chain(cfg.overrides.demoted.iter().map(|t| ("overrides.demoted", t.as_str())));
    for (field, text) in terms {
        if normalizer.tokens(text).is_empty() {
            return Err(DigestError::config(
                field,
                format!("`{text}` has no words left after stopword removal"),
            ));
        }
    }
    Ok(())
}
