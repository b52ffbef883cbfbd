// tests/digest_limits.rs
use chrono::{Duration, TimeZone, Utc};

use news_digest::config::TieBreak;
use news_digest::digest::{select, SelectionParams};
use news_digest::model::article_identifier;
use news_digest::{normalize, Article, ScoredArticle, Topic};

fn topic(name: &str, weight: u8) -> Topic {
    Topic {
        name: name.into(),
        weight,
    }
}

fn scored(topic: &str, title: &str, score: f64, mins_ago: i64) -> ScoredArticle {
    let tokens = normalize(title);
    let link = format!("https://news.example/{}", title.to_lowercase().replace(' ', "-"));
    ScoredArticle {
        identifier: article_identifier(&tokens, &link),
        article: Article {
            title: title.into(),
            link,
            published_at: Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
                - Duration::minutes(mins_ago),
            source_topic: topic.into(),
            raw_score: 0.0,
        },
        score,
        is_trending: false,
        matched_keywords: vec![],
        tokens,
    }
}

fn topics() -> Vec<Topic> {
    vec![
        topic("Climate", 3),
        topic("Space", 4),
        topic("Sports", 1),
        topic("Economy", 2),
    ]
}

fn pool() -> Vec<ScoredArticle> {
    vec![
        scored("Climate", "Glacier melt accelerates", 12.0, 10),
        scored("Climate", "Coral reefs bleach", 9.0, 20),
        scored("Space", "Probe reaches Jupiter orbit", 15.0, 30),
        scored("Sports", "Championship parade draws crowds", 2.0, 5),
        scored("Economy", "Tariff talks stall", 12.0, 40),
        scored("Gardening", "Tomato season arrives", 50.0, 1),
    ]
}

#[test]
fn topics_and_articles_are_capped() {
    let params = SelectionParams {
        max_topics: 2,
        max_articles_per_topic: 1,
        ..SelectionParams::default()
    };
    let d = select(pool(), &topics(), &params);
    assert!(d.topic_count() <= 2);
    assert!(d.sections.iter().all(|s| s.articles.len() <= 1));
    let names: Vec<&str> = d.sections.iter().map(|s| s.topic.name.as_str()).collect();
    assert_eq!(names, vec!["Space", "Climate"]);
}

#[test]
fn topics_ordered_by_best_article_then_tie_break() {
    let params = SelectionParams {
        max_topics: 10,
        max_articles_per_topic: 3,
        tie_break: TieBreak::Newest,
        ..SelectionParams::default()
    };
    let d = select(pool(), &topics(), &params);
    let names: Vec<&str> = d.sections.iter().map(|s| s.topic.name.as_str()).collect();
    // Climate and Economy both peak at 12; the newer headline ranks first
    assert_eq!(names, vec!["Space", "Climate", "Economy", "Sports"]);
    assert_eq!(d.sections[1].articles.len(), 2);
    assert_eq!(d.sections[1].articles[0].article.title, "Glacier melt accelerates");

    let oldest = SelectionParams {
        tie_break: TieBreak::Oldest,
        ..params
    };
    let d = select(pool(), &topics(), &oldest);
    let names: Vec<&str> = d.sections.iter().map(|s| s.topic.name.as_str()).collect();
    assert_eq!(names, vec!["Space", "Economy", "Climate", "Sports"]);
}

#[test]
fn unknown_topics_never_appear() {
    let d = select(pool(), &topics(), &SelectionParams::default());
    assert!(d.sections.iter().all(|s| s.topic.name != "Gardening"));
}

#[test]
fn floor_can_empty_the_digest() {
    let params = SelectionParams {
        min_article_score: 100.0,
        ..SelectionParams::default()
    };
    let d = select(pool(), &topics(), &params);
    assert!(d.is_empty());
    assert_eq!(d.article_count(), 0);

    let params = SelectionParams {
        min_article_score: 10.0,
        ..SelectionParams::default()
    };
    let d = select(pool(), &topics(), &params);
    assert!(d.articles().all(|a| a.score >= 10.0));
    assert!(d.sections.iter().all(|s| s.topic.name != "Sports"));
}
