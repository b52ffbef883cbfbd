// src/config.rs
//! Run configuration loaded from TOML.
//!
//! ```toml
//! [weights]
//! topic = 2
//! keyword = 2
//! trend = 3
//!
//! [thresholds]
//! trend_overlap = 0.3
//! deduplication = 0.5
//! min_article_score = 10.0
//!
//! [limits]
//! max_topics = 7
//! max_articles_per_topic = 1
//!
//! [[topics]]
//! name = "Artificial Intelligence"
//! weight = 5
//!
//! [[keywords]]
//! text = "breakthrough"
//! weight = 5
//! ```
//!
//! Every value is checked by [`DigestConfig::validate`]; a bad value is a
//! [`DigestError::Configuration`] and stops the run before scoring.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DigestError;
use crate::model::{Keyword, Topic};
use crate::similarity::SimilarityMetric;

pub const DEFAULT_CONFIG_PATH: &str = "config/digest.toml";
pub const ENV_CONFIG_PATH: &str = "DIGEST_CONFIG_PATH";
pub const ENV_MIN_ARTICLE_SCORE: &str = "DIGEST_MIN_ARTICLE_SCORE";

const WEIGHT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Which article wins when scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// More recent `published_at` first.
    Newest,
    /// Earlier `published_at` first.
    Oldest,
}

impl TieBreak {
    /// Ordering that puts the preferred timestamp first.
    pub fn order(self, a: &DateTime<Utc>, b: &DateTime<Utc>) -> std::cmp::Ordering {
        match self {
            Self::Newest => b.cmp(a),
            Self::Oldest => a.cmp(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub topic: u8,
    pub keyword: u8,
    pub trend: u8,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            topic: 2,
            keyword: 2,
            trend: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub trend_overlap: f64,
    pub deduplication: f64,
    pub min_article_score: f64,
    /// Fuzzy history match: reject a headline when this share of its tokens
    /// appears in a recently delivered title.
    pub history_match: f64,
    pub fuzzy_history: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            trend_overlap: 0.3,
            deduplication: 0.5,
            min_article_score: 0.0,
            history_match: 0.4,
            fuzzy_history: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub max_topics: usize,
    pub max_articles_per_topic: usize,
    pub max_article_hours: u64,
    pub max_headlines_per_topic: usize,
    pub history_retention_days: u32,
    pub trend_top_tokens: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_topics: 7,
            max_articles_per_topic: 1,
            max_article_hours: 6,
            max_headlines_per_topic: 10,
            history_retention_days: 30,
            trend_top_tokens: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ranking {
    pub selection_tie_break: TieBreak,
    pub dedup_tie_break: TieBreak,
    pub similarity: SimilarityMetric,
}

impl Default for Ranking {
    fn default() -> Self {
        Self {
            selection_tie_break: TieBreak::Newest,
            dedup_tie_break: TieBreak::Oldest,
            similarity: SimilarityMetric::default(),
        }
    }
}

/// Banned terms drop a headline outright; demoted terms scale its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    pub banned: Vec<String>,
    pub demoted: Vec<String>,
    pub demote_factor: f64,
    pub extra_stopwords: Vec<String>,
}

impl Default for Overrides {
    fn default() -> Self {
        Self {
            banned: Vec::new(),
            demoted: Vec::new(),
            demote_factor: 0.5,
            extra_stopwords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigestConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub ordering: Ranking,
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
}

impl DigestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, DigestError> {
        let cfg: DigestConfig =
            toml::from_str(s).map_err(|e| DigestError::config("toml", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, DigestError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DigestError::config("config_path", format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve the path from `$DIGEST_CONFIG_PATH` (or the default), load it,
    /// then apply the `$DIGEST_MIN_ARTICLE_SCORE` override if present.
    pub fn load_default() -> Result<Self, DigestError> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = Self::load_from(&path)?;

        if let Ok(raw) = std::env::var(ENV_MIN_ARTICLE_SCORE) {
            let v = raw.trim().parse::<f64>().map_err(|e| {
                DigestError::config(ENV_MIN_ARTICLE_SCORE, format!("`{raw}` is not a number: {e}"))
            })?;
            cfg.thresholds.min_article_score = v;
            cfg.validate()?;
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DigestError> {
        check_weight("weights.topic", self.weights.topic)?;
        check_weight("weights.keyword", self.weights.keyword)?;
        check_weight("weights.trend", self.weights.trend)?;

        check_unit("thresholds.trend_overlap", self.thresholds.trend_overlap)?;
        check_unit("thresholds.deduplication", self.thresholds.deduplication)?;
        check_unit("thresholds.history_match", self.thresholds.history_match)?;
        if !self.thresholds.min_article_score.is_finite() {
            return Err(DigestError::config(
                "thresholds.min_article_score",
                "must be a finite number",
            ));
        }
        check_unit("overrides.demote_factor", self.overrides.demote_factor)?;

        let l = &self.limits;
        for (field, v) in [
            ("limits.max_topics", l.max_topics),
            ("limits.max_articles_per_topic", l.max_articles_per_topic),
            ("limits.max_headlines_per_topic", l.max_headlines_per_topic),
            ("limits.trend_top_tokens", l.trend_top_tokens),
            ("limits.max_article_hours", l.max_article_hours as usize),
            ("limits.history_retention_days", l.history_retention_days as usize),
        ] {
            if v == 0 {
                return Err(DigestError::config(field, "must be a positive integer"));
            }
        }

        if self.topics.is_empty() {
            return Err(DigestError::config("topics", "at least one topic is required"));
        }
        let mut seen = HashSet::new();
        for t in &self.topics {
            let name = t.name.trim();
            if name.is_empty() {
                return Err(DigestError::config("topics.name", "topic name is empty"));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(DigestError::config(
                    "topics.name",
                    format!("duplicate topic `{name}`"),
                ));
            }
            check_weight(&format!("topics.{name}.weight"), t.weight)?;
        }
        for k in &self.keywords {
            let text = k.text.trim();
            if text.is_empty() {
                return Err(DigestError::config("keywords.text", "keyword text is empty"));
            }
            check_weight(&format!("keywords.{text}.weight"), k.weight)?;
        }
        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::days(i64::from(self.limits.history_retention_days))
    }

    pub fn max_article_age(&self) -> Duration {
        // capped at a century so chrono never overflows
        Duration::hours(self.limits.max_article_hours.min(876_000) as i64)
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

fn check_weight(field: &str, w: u8) -> Result<(), DigestError> {
    if WEIGHT_RANGE.contains(&w) {
        Ok(())
    } else {
        Err(DigestError::config(field, format!("weight {w} outside 1..=5")))
    }
}

fn check_unit(field: &str, v: f64) -> Result<(), DigestError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(DigestError::config(field, format!("{v} outside 0.0..=1.0")))
    }
}
