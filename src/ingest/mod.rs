// src/ingest/mod.rs
//! Fetch collaborator: turns provider feeds into the engine's [`RunInput`].

pub mod providers;
pub mod types;

use chrono::{DateTime, Duration, Utc};

use crate::engine::RunInput;
use crate::ingest::types::{HeadlineProvider, RawHeadline};
use crate::model::{Article, Topic};

#[derive(Debug, Clone, Copy)]
pub struct FetchLimits {
    /// Headlines older than this are dropped.
    pub max_age: Duration,
    pub max_per_topic: usize,
}

/// Keep headlines with a known publish time inside `max_age`, in feed order,
/// up to `max_per_topic`.
pub fn fresh_articles(
    topic: &str,
    raw: Vec<RawHeadline>,
    now: DateTime<Utc>,
    limits: &FetchLimits,
) -> Vec<Article> {
    let cutoff = now - limits.max_age;
    raw.into_iter()
        .filter_map(|h| {
            let published_at = h.published_at?;
            (published_at > cutoff).then_some((h, published_at))
        })
        .take(limits.max_per_topic)
        .enumerate()
        .map(|(pos, (h, published_at))| Article {
            title: h.title,
            link: h.link,
            published_at,
            source_topic: topic.to_string(),
            raw_score: 1.0 / (pos as f64 + 1.0),
        })
        .collect()
}

/// Fetch every topic plus the top-headlines pool. A failing topic is logged
/// and skipped; the run continues with what was fetched.
pub async fn collect_input(
    provider: &(dyn HeadlineProvider + Send + Sync),
    topics: &[Topic],
    limits: &FetchLimits,
    now: DateTime<Utc>,
) -> RunInput {
    let mut headlines = Vec::new();
    for topic in topics {
        match provider.fetch_topic(&topic.name).await {
            Ok(raw) => {
                let fetched = raw.len();
                let fresh = fresh_articles(&topic.name, raw, now, limits);
                tracing::debug!(
                    target: "ingest",
                    topic = %topic.name,
                    fetched,
                    kept = fresh.len(),
                    "topic fetched"
                );
                headlines.extend(fresh);
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = provider.name(), topic = %topic.name, "topic fetch failed");
            }
        }
    }

    let top_headlines = match provider.fetch_top_headlines().await {
        Ok(v) => v.into_iter().map(|h| h.title).collect(),
        Err(e) => {
            tracing::warn!(error = ?e, provider = provider.name(), "top headlines fetch failed");
            Vec::new()
        }
    };

    tracing::info!(
        target: "ingest",
        headlines = headlines.len(),
        top = top_headlines.len(),
        topics = topics.len(),
        "fetch complete"
    );

    RunInput {
        headlines,
        top_headlines,
    }
}
