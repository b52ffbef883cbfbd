// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod digest;
pub mod engine;
pub mod error;
pub mod history;
pub mod model;
pub mod normalize;
pub mod scoring;
pub mod similarity;
pub mod trend;

// Collaborators around the pure engine: fetch, delivery, run guard, metrics
pub mod ingest;
pub mod lock;
pub mod metrics;
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::config::DigestConfig;
pub use crate::engine::{Delivery, DigestEngine, DigestRun, RunInput, RunStats};
pub use crate::error::DigestError;
pub use crate::history::HistoryStore;
pub use crate::model::{Article, Digest, DigestSection, Keyword, ScoredArticle, Topic};
pub use crate::normalize::{normalize, TokenSet};
pub use crate::similarity::{similarity, SimilarityMetric};
