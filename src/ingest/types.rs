// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One feed item as fetched, before it is tied to a configured topic.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct RawHeadline {
    pub title: String, // cleaned display title
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[async_trait::async_trait]
pub trait HeadlineProvider {
    /// Latest headlines matching a topic query, newest feed order.
    async fn fetch_topic(&self, topic: &str) -> Result<Vec<RawHeadline>>;
    /// The global top-stories feed used for trend detection.
    async fn fetch_top_headlines(&self) -> Result<Vec<RawHeadline>>;
    fn name(&self) -> &'static str;
}
