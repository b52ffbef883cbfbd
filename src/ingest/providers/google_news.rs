// src/ingest/providers/google_news.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::{HeadlineProvider, RawHeadline};
use crate::normalize::clean_headline;

pub const DEFAULT_BASE_URL: &str = "https://news.google.com";
const LOCALE: [(&str, &str); 3] = [("hl", "en-US"), ("gl", "US"), ("ceid", "US:en")];

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    match OffsetDateTime::parse(ts, &Rfc2822) {
        Ok(dt) => DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond()),
        // obsolete zone names some feeds still emit
        Err(_) => DateTime::parse_from_rfc2822(ts)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

/// Parse a Google News RSS document. Items without a title are skipped;
/// unparseable dates become `None` and are dropped later by the freshness
/// filter.
pub fn parse_feed(xml: &str) -> Result<Vec<RawHeadline>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing google news rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = clean_headline(it.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            continue;
        }
        out.push(RawHeadline {
            title,
            link: it.link.unwrap_or_default().trim().to_string(),
            published_at: it.pub_date.as_deref().and_then(parse_rfc2822),
        });
    }
    Ok(out)
}

pub struct GoogleNewsProvider {
    mode: Mode,
}

enum Mode {
    Fixture {
        topics: HashMap<String, String>,
        top: Option<String>,
    },
    Http {
        base_url: String,
        client: reqwest::Client,
    },
}

impl GoogleNewsProvider {
    pub fn http() -> Result<Self> {
        Self::http_with_base(DEFAULT_BASE_URL)
    }

    pub fn http_with_base(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (news-digest)")
            .timeout(Duration::from_secs(20))
            .build()
            .context("building http client")?;
        Ok(Self {
            mode: Mode::Http {
                base_url: base_url.trim_end_matches('/').to_string(),
                client,
            },
        })
    }

    /// In-memory feeds keyed by topic (case-insensitive), for tests and
    /// offline runs.
    pub fn from_fixtures<I, K, V>(topics: I, top: Option<&str>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            mode: Mode::Fixture {
                topics: topics
                    .into_iter()
                    .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                    .collect(),
                top: top.map(str::to_string),
            },
        }
    }

    fn search_url(base: &str, topic: &str) -> Result<Url> {
        let mut params = vec![("q", topic)];
        params.extend(LOCALE);
        Url::parse_with_params(&format!("{base}/rss/search"), &params)
            .context("building search url")
    }

    fn top_url(base: &str) -> Result<Url> {
        Url::parse_with_params(&format!("{base}/rss"), &LOCALE).context("building top url")
    }

    async fn get(client: &reqwest::Client, url: Url) -> Result<String> {
        let resp = client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("google news get {url}"))?
            .error_for_status()
            .with_context(|| format!("google news status {url}"))?;
        resp.text().await.context("google news .text()")
    }
}

#[async_trait]
impl HeadlineProvider for GoogleNewsProvider {
    async fn fetch_topic(&self, topic: &str) -> Result<Vec<RawHeadline>> {
        match &self.mode {
            Mode::Fixture { topics, .. } => match topics.get(&topic.to_lowercase()) {
                Some(xml) => parse_feed(xml),
                None => Ok(Vec::new()),
            },
            Mode::Http { base_url, client } => {
                let body = Self::get(client, Self::search_url(base_url, topic)?).await?;
                parse_feed(&body)
            }
        }
    }

    async fn fetch_top_headlines(&self) -> Result<Vec<RawHeadline>> {
        match &self.mode {
            Mode::Fixture { top, .. } => match top {
                Some(xml) => parse_feed(xml),
                None => Ok(Vec::new()),
            },
            Mode::Http { base_url, client } => {
                let body = Self::get(client, Self::top_url(base_url)?).await?;
                parse_feed(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "GoogleNews"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
