use chrono::{DateTime, NaiveDate, Utc};
use database::{Database, PostFilter};
use radar_core::{has_tag, is_pain_tag, CoreError, PostRecord};
use std::collections::BTreeMap;

/// Filters accepted from the presentation layer. Date range and source are
/// pushed down to the store; text and tag filters run on the returned set.
#[derive(Debug, Clone, Default)]
pub struct DashboardFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub source: Option<String>,
    /// Case-insensitive substring over title or text
    pub text: Option<String>,
    /// Comma-delimited tag spec, OR semantics
    pub tags: Option<String>,
}

pub async fn filtered_posts(
    db: &Database,
    filter: &DashboardFilter,
) -> Result<Vec<PostRecord>, CoreError> {
    let pushdown = PostFilter {
        start: filter.start,
        end: filter.end,
        source: filter.source.clone(),
    };
    let mut posts = db.get_posts(&pushdown).await?;

    if let Some(tags) = filter.tags.as_deref() {
        posts.retain(|post| has_tag(&post.tags, tags));
    }

    if let Some(text) = filter.text.as_deref() {
        let needle = text.to_lowercase();
        if !needle.is_empty() {
            posts.retain(|post| {
                post.title.to_lowercase().contains(&needle)
                    || post.text.to_lowercase().contains(&needle)
            });
        }
    }

    Ok(posts)
}

/// Record counts grouped by calendar date of `created_at`, ascending.
pub fn daily_counts(posts: &[PostRecord]) -> Vec<(NaiveDate, usize)> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for post in posts {
        *counts.entry(post.created_at.date_naive()).or_default() += 1;
    }
    counts.into_iter().collect()
}

/// Tag frequencies, most common first. Ties break lexicographically so the
/// ordering is stable across runs.
pub fn top_tags(posts: &[PostRecord], n: usize) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for post in posts {
        for tag in &post.tags {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(tag, count)| (tag.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

/// Share of pain-tag occurrences among all tag occurrences, in percent.
/// An empty filtered set yields 0 rather than a division error.
pub fn pain_percentage(posts: &[PostRecord]) -> f64 {
    let mut total = 0usize;
    let mut pain = 0usize;
    for post in posts {
        for tag in &post.tags {
            total += 1;
            if is_pain_tag(tag) {
                pain += 1;
            }
        }
    }

    if total == 0 {
        0.0
    } else {
        pain as f64 / total as f64 * 100.0
    }
}
