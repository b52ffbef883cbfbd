// src/normalize.rs
//! Headline text normalization: display cleanup for fetched titles and the
//! token-set canonicalization every comparison in the engine runs on.

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Canonical token set of a headline. Ordered so identifiers hash stably.
pub type TokenSet = BTreeSet<String>;

static STOPWORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    stop_words::get(stop_words::LANGUAGE::English)
        .into_iter()
        .map(|w| w.to_lowercase())
        .collect()
});

fn word_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?u)\b\w+\b").expect("word regex"))
}

/// Lower-cases, splits on word boundaries, drops stopwords and one-character
/// tokens, then stems what is left.
pub struct Normalizer {
    stemmer: Stemmer,
    extra_stopwords: HashSet<String>,
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Normalizer")
            .field("extra_stopwords", &self.extra_stopwords.len())
            .finish_non_exhaustive()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            extra_stopwords: HashSet::new(),
        }
    }

    /// Adds user-configured stopwords on top of the built-in English list.
    pub fn with_extra_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for w in words {
            let w = w.as_ref().trim().to_lowercase();
            if !w.is_empty() {
                self.extra_stopwords.insert(w);
            }
        }
        self
    }

    fn is_stopword(&self, word: &str) -> bool {
        STOPWORDS.contains(word) || self.extra_stopwords.contains(word)
    }

    /// Token set for `text`. Empty or whitespace-only input gives an empty set.
    pub fn tokens(&self, text: &str) -> TokenSet {
        let decoded = html_escape::decode_html_entities(text).to_lowercase();
        word_re()
            .find_iter(&decoded)
            .map(|m| m.as_str())
            .filter(|w| w.chars().count() > 1 && !self.is_stopword(w))
            .map(|w| self.stemmer.stem(w).into_owned())
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// Convenience wrapper over a default [`Normalizer`].
pub fn normalize(text: &str) -> TokenSet {
    Normalizer::new().tokens(text)
}

/// Display cleanup for fetched titles: entity decode, tag strip, quote
/// folding, whitespace collapse.
pub fn clean_headline(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 500 {
        out = out.chars().take(500).collect();
    }
    out
}

/// Google News appends " - Publisher" to every title. Drop it so the same
/// story carried by two outlets normalizes the same way.
pub fn strip_publisher_suffix(title: &str) -> &str {
    match title.rsplit_once(" - ") {
        Some((head, publisher))
            if !head.trim().is_empty() && publisher.split_whitespace().count() <= 5 =>
        {
            head.trim_end()
        }
        _ => title,
    }
}
