//! history.rs — rolling record of delivered article identifiers.
//!
//! Persisted as one JSON object `identifier -> { last_seen, title }`,
//! loaded in full at run start and overwritten in full at run end. The file
//! is single-writer: the binary holds the run lock for the whole run.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::DigestError;

pub const DEFAULT_HISTORY_PATH: &str = "history.json";
pub const ENV_HISTORY_PATH: &str = "DIGEST_HISTORY_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub last_seen: DateTime<Utc>,
    // kept for fuzzy matching of re-worded headlines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryStore {
    entries: BTreeMap<String, HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Missing file → empty store. Unreadable or malformed file →
    /// [`DigestError::CorruptHistory`].
    pub fn load(path: &Path) -> Result<Self, DigestError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => {
                return Err(DigestError::CorruptHistory {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };
        Self::from_json_str(&content).map_err(|e| DigestError::CorruptHistory {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Like [`load`](Self::load) but recovers from corruption with an empty
    /// store.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(target: "digest", error = %e, "history unreadable, starting empty");
                Self::new()
            }
        }
    }

    /// Overwrites `path` atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), DigestError> {
        let io_err = |source| DigestError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.get(id)
    }

    /// True when `id` was seen within `retention` of `now`.
    pub fn is_recent(&self, id: &str, now: DateTime<Utc>, retention: Duration) -> bool {
        self.entries
            .get(id)
            .is_some_and(|e| e.last_seen >= now - retention)
    }

    /// Titles of entries still inside the retention window.
    pub fn recent_titles(
        &self,
        now: DateTime<Utc>,
        retention: Duration,
    ) -> impl Iterator<Item = &str> {
        let cutoff = now - retention;
        self.entries
            .values()
            .filter(move |e| e.last_seen >= cutoff)
            .filter_map(|e| e.title.as_deref())
    }

    /// Insert or refresh an entry; `last_seen` only moves forward.
    pub fn record(&mut self, id: impl Into<String>, title: Option<String>, seen_at: DateTime<Utc>) {
        let entry = self.entries.entry(id.into()).or_insert(HistoryEntry {
            last_seen: seen_at,
            title: None,
        });
        if seen_at > entry.last_seen {
            entry.last_seen = seen_at;
        }
        if title.is_some() {
            entry.title = title;
        }
    }

    /// Drop entries older than the retention horizon. Returns how many.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let cutoff = now - retention;
        let before = self.entries.len();
        self.entries.retain(|_, e| e.last_seen >= cutoff);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn recency_respects_retention() {
        let mut h = HistoryStore::new();
        h.record("a", None, t(1));
        assert!(h.is_recent("a", t(5), Duration::days(7)));
        assert!(!h.is_recent("a", t(20), Duration::days(7)));
        assert!(!h.is_recent("missing", t(5), Duration::days(7)));
    }

    #[test]
    fn prune_drops_only_stale() {
        let mut h = HistoryStore::new();
        h.record("old", None, t(1));
        h.record("new", Some("Fresh".into()), t(10));
        assert_eq!(h.prune(t(12), Duration::days(5)), 1);
        assert!(h.get("old").is_none());
        assert!(h.get("new").is_some());
    }

    #[test]
    fn record_keeps_latest_timestamp() {
        let mut h = HistoryStore::new();
        h.record("a", Some("x".into()), t(10));
        h.record("a", None, t(2));
        let e = h.get("a").unwrap();
        assert_eq!(e.last_seen, t(10));
        assert_eq!(e.title.as_deref(), Some("x"));
    }

    #[test]
    fn missing_file_is_empty_and_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("history.json");
        assert!(HistoryStore::load(&p).unwrap().is_empty());

        fs::write(&p, "{ not json").unwrap();
        let err = HistoryStore::load(&p).unwrap_err();
        assert!(matches!(err, DigestError::CorruptHistory { .. }));
        assert!(HistoryStore::load_or_empty(&p).is_empty());
    }

    #[test]
    fn save_then_load_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("state").join("history.json");
        let mut h = HistoryStore::new();
        h.record("abc", Some("Senate passes bill".into()), t(3));
        h.save(&p).unwrap();
        let back = HistoryStore::load(&p).unwrap();
        assert_eq!(back, h);
    }
}
