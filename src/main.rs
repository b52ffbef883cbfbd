//! News digest: one scheduled run.
//! fetch → score/dedup/select → deliver → commit history.
//!
//! Environment: see `.env.example`.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_digest::history::{DEFAULT_HISTORY_PATH, ENV_HISTORY_PATH};
use news_digest::ingest::providers::GoogleNewsProvider;
use news_digest::ingest::{collect_input, FetchLimits};
use news_digest::lock::{RunLock, DEFAULT_LOCK_PATH, ENV_LOCK_PATH};
use news_digest::notify::{DigestMessage, EmailNotifier, Notifier};
use news_digest::{metrics, Delivery, DigestConfig, DigestEngine, HistoryStore, RunInput};

fn env_flag(key: &str) -> bool {
    std::env::var(key).ok().is_some_and(|v| v == "1")
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_digest=info,digest=info,ingest=info,warn"));

    if env_flag("DIGEST_LOG_JSON") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

async fn load_input(cfg: &DigestConfig, now: chrono::DateTime<Utc>) -> Result<RunInput> {
    // Offline input, e.g. a saved fetch.
    if let Ok(path) = std::env::var("DIGEST_INPUT_PATH") {
        let raw = std::fs::read_to_string(&path).with_context(|| format!("read input {path}"))?;
        return serde_json::from_str(&raw).with_context(|| format!("parse input {path}"));
    }
    let provider = GoogleNewsProvider::http()?;
    let limits = FetchLimits {
        max_age: cfg.max_article_age(),
        max_per_topic: cfg.limits.max_headlines_per_topic,
    };
    Ok(collect_input(&provider, &cfg.topics, &limits, now).await)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();
    let prom = metrics::install_prometheus()?;

    let _lock = RunLock::acquire(env_path(ENV_LOCK_PATH, DEFAULT_LOCK_PATH))?;

    let cfg = DigestConfig::load_default()?;
    let engine = DigestEngine::new(cfg)?;
    let history_path = env_path(ENV_HISTORY_PATH, DEFAULT_HISTORY_PATH);
    let history = HistoryStore::load_or_empty(&history_path);

    let now = Utc::now();
    let input = load_input(engine.config(), now).await?;
    let run = engine.run(&input, history, now);

    let delivered = if env_flag("DIGEST_DRY_RUN") {
        println!("{}", serde_json::to_string_pretty(&run.digest)?);
        Ok(Delivery::DryRun)
    } else if run.digest.is_empty() {
        tracing::info!(target: "digest", "nothing new, no email sent");
        Ok(Delivery::NothingToSend)
    } else {
        let msg = DigestMessage::build(
            &run.digest,
            &run.stats,
            now,
            engine.config().limits.max_article_hours,
        );
        match EmailNotifier::from_env() {
            Ok(notifier) => notifier.deliver(&msg).await.map(|()| Delivery::Sent),
            Err(e) => Err(e),
        }
    };

    tracing::debug!(target: "digest", snapshot = %prom.render(), "metrics");

    match delivered {
        Ok(delivery) => {
            if let Some(history) = run.settle(delivery) {
                history.save(&history_path)?;
                tracing::info!(target: "digest", path = %history_path.display(), size = history.len(), "history saved");
            }
            Ok(())
        }
        Err(e) => {
            // history stays as loaded so the same stories are retried next run
            let _ = run.abandon();
            Err(e.context("deliver digest"))
        }
    }
}
