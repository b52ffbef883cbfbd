//! Delivery collaborator: renders a digest and hands it to a transport.

pub mod email;
pub mod render;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::engine::RunStats;
use crate::model::Digest;

pub use email::EmailNotifier;

/// Rendered digest ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl DigestMessage {
    pub fn build(digest: &Digest, stats: &RunStats, now: DateTime<Utc>, max_article_hours: u64) -> Self {
        Self {
            subject: render::subject(now),
            html: render::html(digest, stats, max_article_hours),
            text: render::text(digest),
        }
    }
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, msg: &DigestMessage) -> Result<()>;
    fn name(&self) -> &'static str;
}
