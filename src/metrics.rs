//! Run counters. The library only emits through the `metrics` facade; the
//! binary installs a Prometheus recorder and logs the rendered snapshot.

use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const HEADLINES: &str = "digest_headlines_total";
pub const BANNED: &str = "digest_banned_total";
pub const SEEN_BEFORE: &str = "digest_seen_before_total";
pub const DUPLICATES: &str = "digest_duplicates_total";
pub const BELOW_FLOOR: &str = "digest_below_min_score_total";
pub const DELIVERED: &str = "digest_articles_selected_total";
pub const TRENDING: &str = "digest_trending_topics";
pub const LAST_RUN_TS: &str = "digest_last_run_ts";

/// One-time metrics registration (so series show up in the snapshot).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(HEADLINES, "Headlines handed to the engine.");
        describe_counter!(BANNED, "Headlines dropped by a banned term.");
        describe_counter!(SEEN_BEFORE, "Headlines already delivered within retention.");
        describe_counter!(DUPLICATES, "Near-duplicates removed within a batch.");
        describe_counter!(BELOW_FLOOR, "Articles under the minimum score.");
        describe_counter!(DELIVERED, "Articles placed in the digest.");
        describe_gauge!(TRENDING, "Topics marked trending in the last run.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when the engine last ran.");
    });
}

/// Install the Prometheus recorder for this process.
pub fn install_prometheus() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
    ensure_described();
    Ok(handle)
}
