// src/digest.rs
//! Digest selection: score floor, grouping by topic, topic ranking and caps.

use crate::config::TieBreak;
use crate::dedup::rank_order;
use crate::model::{Digest, DigestSection, ScoredArticle, Topic};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionParams {
    pub min_article_score: f64,
    pub max_topics: usize,
    pub max_articles_per_topic: usize,
    pub tie_break: TieBreak,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            min_article_score: 0.0,
            max_topics: 7,
            max_articles_per_topic: 1,
            tie_break: TieBreak::Newest,
        }
    }
}

/// Build the digest. Articles whose `source_topic` is not one of `topics`
/// are ignored. No surviving topic gives an empty digest, which is a valid
/// result.
pub fn select(scored: Vec<ScoredArticle>, topics: &[Topic], params: &SelectionParams) -> Digest {
    let mut groups: Vec<(Topic, Vec<ScoredArticle>)> =
        topics.iter().map(|t| (t.clone(), Vec::new())).collect();

    for a in scored {
        if a.score < params.min_article_score {
            continue;
        }
        if let Some((_, bucket)) = groups
            .iter_mut()
            .find(|(t, _)| t.name.eq_ignore_ascii_case(a.article.source_topic.trim()))
        {
            bucket.push(a);
        }
    }

    groups.retain(|(_, v)| !v.is_empty());
    for (_, v) in groups.iter_mut() {
        v.sort_by(|a, b| rank_order(a, b, params.tie_break));
    }

    // each bucket is sorted and non-empty, so [0] is its best article
    groups.sort_by(|(ta, va), (tb, vb)| {
        rank_order(&va[0], &vb[0], params.tie_break)
            .then_with(|| tb.weight.cmp(&ta.weight))
            .then_with(|| ta.name.cmp(&tb.name))
    });
    groups.truncate(params.max_topics);

    let sections = groups
        .into_iter()
        .map(|(topic, mut articles)| {
            articles.truncate(params.max_articles_per_topic);
            DigestSection { topic, articles }
        })
        .collect();

    Digest { sections }
}
