use crate::hooks::apply_url_tag_rules;
use chrono::{Duration, Utc};
use database::Database;
use radar_core::{
    AppConfig, CoreError, PostRecord, RawItem, RunStats, Tagger, TaggerConfig, UrlTagRules,
    DELETED_AUTHOR, REDDIT_SOURCE,
};
use reddit_client::RedditClient;
use rss_client::FeedClient;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

/// How one source keys, labels, and post-processes its items.
struct SourceContext<'a> {
    source: &'a str,
    id_prefix: &'a str,
    default_author: &'a str,
    subreddit: Option<&'a str>,
    tag_rules: Option<&'a UrlTagRules>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    pub reddit: RunStats,
    pub feeds: RunStats,
}

impl RunSummary {
    pub fn overall(&self) -> RunStats {
        let mut overall = self.reddit;
        overall.merge(&self.feeds);
        overall
    }
}

pub struct Collector {
    db: Database,
    tagger: Tagger,
    config: AppConfig,
}

impl Collector {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let tagger = Tagger::new(TaggerConfig {
            min_tags: config.min_tags,
        });
        Self { db, tagger, config }
    }

    /// Run every configured source. Per-source failures are logged and
    /// counted; they never abort the rest of the run. Zero new items is a
    /// normal outcome of frequent re-polling, not a failure.
    pub async fn run(&self) -> RunSummary {
        let reddit = self.collect_reddit().await;
        let feeds = self.collect_feeds().await;
        RunSummary { reddit, feeds }
    }

    async fn collect_reddit(&self) -> RunStats {
        let mut overall = RunStats::default();

        if !self.config.has_reddit_credentials() {
            warn!("Reddit credentials not configured; skipping Reddit collection");
            overall.errors += 1;
            return overall;
        }

        let client = match RedditClient::new(self.config.reddit.clone()) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to construct Reddit client: {}", e);
                overall.errors += 1;
                return overall;
            }
        };

        for subreddit in &self.config.subreddits {
            info!("Collecting from r/{}", subreddit);
            let mut stats = RunStats::default();

            match client
                .fetch_new_posts(subreddit, self.config.limit_per_subreddit)
                .await
            {
                Ok(items) => {
                    let context = SourceContext {
                        source: REDDIT_SOURCE,
                        id_prefix: "reddit",
                        default_author: DELETED_AUTHOR,
                        subreddit: Some(subreddit),
                        tag_rules: None,
                    };
                    if let Err(e) = self.ingest_items(&context, items, &mut stats).await {
                        error!("Ingestion failed for r/{}: {}", subreddit, e);
                        stats.errors += 1;
                    }
                }
                Err(e) => {
                    error!("Error collecting from r/{}: {}", subreddit, e);
                    stats.errors += 1;
                }
            }

            info!(
                "r/{}: processed {}, new {}, skipped {}",
                subreddit, stats.total, stats.new, stats.skipped
            );
            overall.merge(&stats);
        }

        overall
    }

    async fn collect_feeds(&self) -> RunStats {
        let mut overall = RunStats::default();

        let client = match FeedClient::new(&self.config.reddit.user_agent) {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to construct feed client: {}", e);
                overall.errors += 1;
                return overall;
            }
        };

        for feed in &self.config.feeds {
            info!("Fetching feed {}", feed.name);
            let mut stats = RunStats::default();

            match client.fetch_entries(feed).await {
                Ok(items) => {
                    let context = SourceContext {
                        source: &feed.name,
                        id_prefix: "rss",
                        // Feed entries without an author are attributed to
                        // the feed itself
                        default_author: &feed.name,
                        subreddit: None,
                        tag_rules: feed.post_tags.as_ref(),
                    };
                    if let Err(e) = self.ingest_items(&context, items, &mut stats).await {
                        error!("Ingestion failed for feed {}: {}", feed.name, e);
                        stats.errors += 1;
                    }
                }
                Err(e) => {
                    error!("Error collecting from feed {}: {}", feed.name, e);
                    stats.errors += 1;
                }
            }

            info!(
                "{}: processed {}, new {}, skipped {}",
                feed.name, stats.total, stats.new, stats.skipped
            );
            overall.merge(&stats);
        }

        overall
    }

    /// Normalize, gate, tag and insert one source's items. Counters are
    /// updated in place so a mid-batch storage error keeps the partial
    /// stats; records inserted before the error remain valid.
    async fn ingest_items(
        &self,
        context: &SourceContext<'_>,
        items: Vec<RawItem>,
        stats: &mut RunStats,
    ) -> Result<(), CoreError> {
        let now = Utc::now();
        let cutoff = now - Duration::days(self.config.days_back);

        for item in items {
            stats.total += 1;

            // Undated items are assumed recent rather than dropped
            let created_at = item.published_at.unwrap_or(now);
            if created_at < cutoff {
                continue;
            }

            let id = derive_post_id(context.id_prefix, &item);

            // Fast path only; the insert constraint still guards correctness
            if self.db.post_exists(&id).await? {
                stats.skipped += 1;
                continue;
            }

            if !self.tagger.is_relevant(&item.title, &item.body) {
                stats.skipped += 1;
                continue;
            }

            let mut tags = self.tagger.tag_content(&item.title, &item.body);
            if let Some(rules) = context.tag_rules {
                tags = apply_url_tag_rules(rules, &item.permalink, tags);
            }

            let record = PostRecord {
                id,
                source: context.source.to_string(),
                title: item.title,
                text: item.body,
                author: item
                    .author
                    .unwrap_or_else(|| context.default_author.to_string()),
                url: item.permalink,
                score: item.score.unwrap_or(0),
                created_at,
                collected_at: now,
                tags,
                subreddit: context.subreddit.map(str::to_string),
            };

            if self.db.insert_post(&record).await? {
                stats.new += 1;
            } else {
                stats.skipped += 1;
            }
        }

        Ok(())
    }
}

/// Stable dedup key: source-qualified native id when the source has one,
/// otherwise a content hash of permalink and title.
fn derive_post_id(prefix: &str, item: &RawItem) -> String {
    match &item.native_id {
        Some(native) => format!("{}_{}", prefix, native),
        None => {
            let mut hasher = Sha256::new();
            hasher.update(item.permalink.as_bytes());
            hasher.update(item.title.as_bytes());
            format!("{}_{:x}", prefix, hasher.finalize())
        }
    }
}
