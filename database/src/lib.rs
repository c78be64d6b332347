use chrono::{DateTime, Utc};
use radar_core::{CoreError, DatabaseError, PostRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{FromRow, QueryBuilder};
use std::str::FromStr;
use tracing::{debug, info};

#[cfg(test)]
mod tests;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        title TEXT NOT NULL,
        text TEXT NOT NULL,
        author TEXT NOT NULL,
        url TEXT NOT NULL,
        score INTEGER NOT NULL,
        created_at DATETIME NOT NULL,
        collected_at DATETIME NOT NULL,
        tags TEXT NOT NULL,
        subreddit TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_posts_source ON posts(source)",
    "CREATE INDEX IF NOT EXISTS idx_posts_tags ON posts(tags)",
];

/// Pushed-down filters; free-text and tag filters are applied downstream on
/// the returned set.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub total_posts: i64,
    pub unique_authors: i64,
    pub sources: i64,
    pub earliest_post: Option<DateTime<Utc>>,
    pub latest_post: Option<DateTime<Utc>>,
}

/// Row shape as persisted; tags live as a JSON array in TEXT.
#[derive(Debug, FromRow)]
struct PostRow {
    id: String,
    source: String,
    title: String,
    text: String,
    author: String,
    url: String,
    score: i64,
    created_at: DateTime<Utc>,
    collected_at: DateTime<Utc>,
    tags: String,
    subreddit: Option<String>,
}

impl PostRow {
    fn into_record(self) -> Result<PostRecord, CoreError> {
        let tags: Vec<String> = serde_json::from_str(&self.tags)?;
        Ok(PostRecord {
            id: self.id,
            source: self.source,
            title: self.title,
            text: self.text,
            author: self.author,
            url: self.url,
            score: self.score,
            created_at: self.created_at,
            collected_at: self.collected_at,
            tags,
            subreddit: self.subreddit,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    /// Idempotent schema setup, safe to run on every process start.
    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DatabaseError::MigrationFailed {
                    reason: e.to_string(),
                })?;
        }
        info!("Database schema ready");
        Ok(())
    }

    /// Persist a record keyed by id. Returns false when an identically-keyed
    /// record already exists. Dedup relies on the PRIMARY KEY constraint
    /// rather than a pre-check, so concurrent writers cannot race a
    /// duplicate past it.
    pub async fn insert_post(&self, post: &PostRecord) -> Result<bool, CoreError> {
        let tags = serde_json::to_string(&post.tags)?;

        let result = sqlx::query(
            "INSERT INTO posts \
             (id, source, title, text, author, url, score, created_at, collected_at, tags, subreddit) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id)
        .bind(&post.source)
        .bind(&post.title)
        .bind(&post.text)
        .bind(&post.author)
        .bind(&post.url)
        .bind(post.score)
        .bind(post.created_at)
        .bind(post.collected_at)
        .bind(tags)
        .bind(&post.subreddit)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!("Duplicate insert ignored for {}", post.id);
                Ok(false)
            }
            Err(e) => Err(DatabaseError::Sql(e).into()),
        }
    }

    /// Cheap existence probe used as an ingestion fast path. Correctness of
    /// dedup is guaranteed by `insert_post`, not by this check.
    pub async fn post_exists(&self, id: &str) -> Result<bool, CoreError> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM posts WHERE id = ? LIMIT 1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;

        Ok(row.is_some())
    }

    /// Records with `created_at` inside the inclusive filter window and
    /// matching source, newest first.
    pub async fn get_posts(&self, filter: &PostFilter) -> Result<Vec<PostRecord>, CoreError> {
        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "SELECT id, source, title, text, author, url, score, created_at, collected_at, tags, subreddit \
             FROM posts WHERE 1=1",
        );

        if let Some(start) = filter.start {
            query.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = filter.end {
            query.push(" AND created_at <= ").push_bind(end);
        }
        if let Some(source) = &filter.source {
            query.push(" AND source = ").push_bind(source.clone());
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<PostRow> = query
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(DatabaseError::Sql)?;

        rows.into_iter().map(PostRow::into_record).collect()
    }

    /// Aggregate summary over the entire store, unfiltered.
    pub async fn stats(&self) -> Result<StoreStats, CoreError> {
        let row: (i64, i64, i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT author), COUNT(DISTINCT source), \
             MIN(created_at), MAX(created_at) FROM posts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Sql)?;

        Ok(StoreStats {
            total_posts: row.0,
            unique_authors: row.1,
            sources: row.2,
            earliest_post: row.3,
            latest_post: row.4,
        })
    }
}
