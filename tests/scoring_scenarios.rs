// tests/scoring_scenarios.rs
//
// Score arithmetic through the public engine: topic weight, keyword matches,
// trend bonus, and the ban/demote overrides.

use chrono::{DateTime, Duration, TimeZone, Utc};

use news_digest::{
    Article, DigestConfig, DigestEngine, DigestError, HistoryStore, Keyword, RunInput, Topic,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap()
}

fn article(topic: &str, title: &str, mins_ago: i64) -> Article {
    Article {
        title: title.into(),
        link: format!("https://news.example/{}", title.to_lowercase().replace(' ', "-")),
        published_at: now() - Duration::minutes(mins_ago),
        source_topic: topic.into(),
        raw_score: 0.0,
    }
}

fn config() -> DigestConfig {
    let mut c = DigestConfig::default();
    c.topics = vec![
        Topic {
            name: "Artificial Intelligence".into(),
            weight: 5,
        },
        Topic {
            name: "Volcanoes".into(),
            weight: 2,
        },
    ];
    c.keywords = vec![Keyword {
        text: "breakthrough".into(),
        weight: 5,
    }];
    c.limits.max_articles_per_topic = 5;
    c
}

fn top_pool() -> Vec<String> {
    vec![
        "Quantum chip rivals race after lab result - AP".into(),
        "Investors pile into quantum chip makers - Bloomberg".into(),
        "Heatwave grips southern Europe - BBC".into(),
    ]
}

#[test]
fn keyword_match_adds_weighted_bonus() {
    let engine = DigestEngine::new(config()).unwrap();
    let input = RunInput {
        headlines: vec![article(
            "Artificial Intelligence",
            "Quantum chip breakthrough stuns researchers",
            30,
        )],
        top_headlines: vec![],
    };
    let run = engine.run(&input, HistoryStore::new(), now());
    let a = &run.digest.sections[0].articles[0];
    // 2*5 (topic) + 2*5 (keyword)
    assert_eq!(a.score, 20.0);
    assert!(!a.is_trending);
}

#[test]
fn trending_topic_adds_trend_bonus() {
    let engine = DigestEngine::new(config()).unwrap();
    let input = RunInput {
        headlines: vec![
            article(
                "Artificial Intelligence",
                "Quantum chip breakthrough stuns researchers",
                30,
            ),
            article("Volcanoes", "Volcano erupts in Iceland", 40),
        ],
        top_headlines: top_pool(),
    };
    let run = engine.run(&input, HistoryStore::new(), now());
    assert_eq!(run.stats.trending_topics, 1);

    let ai = &run.digest.sections[0];
    assert_eq!(ai.topic.name, "Artificial Intelligence");
    assert!(ai.articles[0].is_trending);
    // 20 + 3*5 (trend)
    assert_eq!(ai.articles[0].score, 35.0);

    let volcano = &run.digest.sections[1];
    assert!(!volcano.articles[0].is_trending);
    assert_eq!(volcano.articles[0].score, 4.0);
}

#[test]
fn single_top_headline_gives_no_trend() {
    let engine = DigestEngine::new(config()).unwrap();
    let input = RunInput {
        headlines: vec![article(
            "Artificial Intelligence",
            "Quantum chip breakthrough stuns researchers",
            30,
        )],
        top_headlines: vec!["Quantum chip rivals race after lab result".into()],
    };
    let run = engine.run(&input, HistoryStore::new(), now());
    assert_eq!(run.stats.trending_topics, 0);
    assert_eq!(run.digest.sections[0].articles[0].score, 20.0);
}

#[test]
fn banned_terms_drop_and_demoted_terms_halve() {
    let mut c = config();
    c.overrides.banned = vec!["gossip".into()];
    c.overrides.demoted = vec!["sponsored".into()];
    c.overrides.demote_factor = 0.5;
    let engine = DigestEngine::new(c).unwrap();

    let input = RunInput {
        headlines: vec![
            article("Volcanoes", "Celebrity gossip erupts near volcano", 10),
            article(
                "Artificial Intelligence",
                "Sponsored quantum breakthrough showcase",
                20,
            ),
        ],
        top_headlines: vec![],
    };
    let run = engine.run(&input, HistoryStore::new(), now());
    assert_eq!(run.stats.banned, 1);
    assert_eq!(run.digest.topic_count(), 1);
    assert_eq!(run.digest.sections[0].articles[0].score, 10.0);
}

#[test]
fn score_article_is_pure() {
    let engine = DigestEngine::new(config()).unwrap();
    let topic = engine.config().topics[0].clone();
    let tokens = engine.headline_tokens("Breakthrough in lab - Reuters");
    let first = engine.score_article(&tokens, &topic, false);
    let second = engine.score_article(&tokens, &topic, false);
    assert_eq!(first, second);
    assert_eq!(first, 20.0);
    assert_eq!(engine.score_article(&tokens, &topic, true), 35.0);
}

#[test]
fn common_news_words_match_as_keywords() {
    let mut c = DigestConfig::default();
    c.topics = vec![
        Topic {
            name: "Economy".into(),
            weight: 3,
        },
        Topic {
            name: "Artificial Intelligence".into(),
            weight: 5,
        },
    ];
    c.keywords = vec![
        Keyword {
            text: "interest".into(),
            weight: 5,
        },
        Keyword {
            text: "AI".into(),
            weight: 4,
        },
    ];
    let engine = DigestEngine::new(c).unwrap();
    let input = RunInput {
        headlines: vec![
            article("Economy", "Interest rates climb again", 10),
            article("Artificial Intelligence", "AI chip race heats up", 20),
        ],
        top_headlines: vec![],
    };
    let run = engine.run(&input, HistoryStore::new(), now());

    let find = |title: &str| {
        run.digest
            .articles()
            .find(|a| a.article.title == title)
            .cloned()
            .unwrap()
    };
    let rates = find("Interest rates climb again");
    // 2*3 (topic) + 2*5 (keyword)
    assert_eq!(rates.score, 16.0);
    assert_eq!(rates.matched_keywords, vec!["interest".to_string()]);

    let ai = find("AI chip race heats up");
    // 2*5 (topic) + 2*4 (keyword)
    assert_eq!(ai.score, 18.0);
    assert_eq!(ai.matched_keywords, vec!["AI".to_string()]);
}

#[test]
fn stopword_only_terms_are_rejected() {
    let mut c = config();
    c.keywords.push(Keyword {
        text: "the".into(),
        weight: 2,
    });
    assert!(matches!(
        DigestEngine::new(c),
        Err(DigestError::Configuration { ref field, .. }) if field == "keywords.text"
    ));

    let mut c = config();
    c.overrides.banned = vec!["of the".into()];
    assert!(matches!(
        DigestEngine::new(c),
        Err(DigestError::Configuration { ref field, .. }) if field == "overrides.banned"
    ));

    let mut c = config();
    c.overrides.demoted = vec!["sponsored".into()];
    c.overrides.extra_stopwords = vec!["sponsored".into()];
    assert!(matches!(
        DigestEngine::new(c),
        Err(DigestError::Configuration { ref field, .. }) if field == "overrides.demoted"
    ));
}
