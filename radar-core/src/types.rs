use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author sentinel for removed or missing accounts
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Source label for posts collected from Reddit
pub const REDDIT_SOURCE: &str = "Reddit";

/// Canonical stored unit. Created exactly once at first ingestion of its
/// `id`; never updated or deleted afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub source: String,
    pub title: String,
    pub text: String,
    pub author: String,
    pub url: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub collected_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub subreddit: Option<String>,
}

/// Raw item as handed over by a source client, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub native_id: Option<String>,
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub permalink: String,
    pub score: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
}

/// Per-source ingestion counters for one collection run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub new: u64,
    pub skipped: u64,
    pub total: u64,
    pub errors: u64,
}

impl RunStats {
    pub fn merge(&mut self, other: &RunStats) {
        self.new += other.new;
        self.skipped += other.skipped;
        self.total += other.total;
        self.errors += other.errors;
    }
}
