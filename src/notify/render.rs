// src/notify/render.rs
//! HTML and plain-text bodies for the digest email. Times are shown in UTC.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;

use crate::engine::RunStats;
use crate::model::Digest;

const DATE_FMT: &str = "%a, %d %b %Y %I:%M %p UTC";

pub fn subject(now: DateTime<Utc>) -> String {
    format!("News \u{2013} {}", now.format("%Y-%m-%d %I:%M %p UTC"))
}

pub fn html(digest: &Digest, stats: &RunStats, max_article_hours: u64) -> String {
    let mut out = String::from("<h2>Your News</h2>");
    for section in &digest.sections {
        let _ = write!(
            out,
            r#"<h3 style="margin: 0 0 0 0;">{}</h3>"#,
            encode_text(&section.topic.name)
        );
        for a in &section.articles {
            let _ = write!(
                out,
                r#"<p style="margin: 0.4em 0 1.2em 0;"><a href="{}" target="_blank">{}</a><br><span style="font-size: 0.9em;">{}</span></p>"#,
                encode_double_quoted_attribute(&a.article.link),
                encode_text(&a.article.title),
                a.article.published_at.format(DATE_FMT)
            );
        }
    }
    let _ = write!(
        out,
        "<hr><small>Selected {} of {} headlines published in the last {} hours.</small>",
        digest.article_count(),
        stats.fetched,
        max_article_hours
    );
    out
}

pub fn text(digest: &Digest) -> String {
    let mut out = String::new();
    for section in &digest.sections {
        let _ = writeln!(out, "{}", section.topic.name);
        for a in &section.articles {
            let _ = writeln!(out, "  - {}", a.article.title);
            let _ = writeln!(out, "    {}", a.article.link);
        }
        out.push('\n');
    }
    out
}
