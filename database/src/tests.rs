use crate::{Database, PostFilter};
use chrono::{TimeZone, Utc};
use radar_core::PostRecord;
use std::env;

async fn setup_test_db() -> Database {
    let db_path = env::temp_dir().join(format!("test_radar_{}.db", uuid::Uuid::new_v4()));
    let db_url = format!("sqlite://{}", db_path.display());

    let db = Database::connect(&db_url)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations()
        .await
        .expect("Failed to run migrations");

    db
}

fn sample_post(id: &str, created_at_secs: i64) -> PostRecord {
    PostRecord {
        id: id.to_string(),
        source: "Reddit".to_string(),
        title: "GST portal down again".to_string(),
        text: "unable to login since morning".to_string(),
        author: "filing_fury".to_string(),
        url: format!("https://reddit.com/r/IndiaTax/comments/{}", id),
        score: 12,
        created_at: Utc.timestamp_opt(created_at_secs, 0).unwrap(),
        collected_at: Utc.timestamp_opt(created_at_secs + 60, 0).unwrap(),
        tags: vec![
            "GST".to_string(),
            "Negative".to_string(),
            "PortalIssues".to_string(),
        ],
        subreddit: Some("IndiaTax".to_string()),
    }
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let db = setup_test_db().await;
    db.run_migrations()
        .await
        .expect("Second migration run should be a no-op");
}

#[tokio::test]
async fn test_insert_then_duplicate() {
    let db = setup_test_db().await;
    let post = sample_post("reddit_abc123", 1_700_000_000);

    assert!(db.insert_post(&post).await.unwrap());
    assert!(!db.insert_post(&post).await.unwrap());

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.total_posts, 1);
}

#[tokio::test]
async fn test_post_exists() {
    let db = setup_test_db().await;
    let post = sample_post("reddit_abc123", 1_700_000_000);

    assert!(!db.post_exists("reddit_abc123").await.unwrap());
    db.insert_post(&post).await.unwrap();
    assert!(db.post_exists("reddit_abc123").await.unwrap());
}

#[tokio::test]
async fn test_round_trip_preserves_fields() {
    let db = setup_test_db().await;
    let post = sample_post("reddit_abc123", 1_700_000_000);
    db.insert_post(&post).await.unwrap();

    let fetched = db.get_posts(&PostFilter::default()).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0], post);
}

#[tokio::test]
async fn test_query_window_is_inclusive_and_descending() {
    let db = setup_test_db().await;
    let base = 1_700_000_000;
    for (id, offset) in [("reddit_a", 0), ("reddit_b", 3600), ("reddit_c", 7200)] {
        db.insert_post(&sample_post(id, base + offset)).await.unwrap();
    }

    let filter = PostFilter {
        start: Some(Utc.timestamp_opt(base, 0).unwrap()),
        end: Some(Utc.timestamp_opt(base + 3600, 0).unwrap()),
        source: None,
    };
    let posts = db.get_posts(&filter).await.unwrap();

    // Both boundary records included, newest first
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, "reddit_b");
    assert_eq!(posts[1].id, "reddit_a");
}

#[tokio::test]
async fn test_query_source_filter() {
    let db = setup_test_db().await;
    db.insert_post(&sample_post("reddit_a", 1_700_000_000))
        .await
        .unwrap();

    let mut feed_post = sample_post("rss_b", 1_700_000_100);
    feed_post.source = "TaxGuru".to_string();
    feed_post.subreddit = None;
    db.insert_post(&feed_post).await.unwrap();

    let filter = PostFilter {
        source: Some("TaxGuru".to_string()),
        ..Default::default()
    };
    let posts = db.get_posts(&filter).await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, "rss_b");
}

#[tokio::test]
async fn test_stats_aggregates() {
    let db = setup_test_db().await;

    let earliest = sample_post("reddit_a", 1_700_000_000);
    let mut latest = sample_post("rss_b", 1_700_007_200);
    latest.source = "TaxGuru".to_string();
    latest.author = "TaxGuru".to_string();

    db.insert_post(&earliest).await.unwrap();
    db.insert_post(&latest).await.unwrap();

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.total_posts, 2);
    assert_eq!(stats.unique_authors, 2);
    assert_eq!(stats.sources, 2);
    assert_eq!(stats.earliest_post, Some(earliest.created_at));
    assert_eq!(stats.latest_post, Some(latest.created_at));
}

#[tokio::test]
async fn test_empty_store_stats() {
    let db = setup_test_db().await;

    let stats = db.stats().await.unwrap();
    assert_eq!(stats.total_posts, 0);
    assert_eq!(stats.earliest_post, None);
    assert_eq!(stats.latest_post, None);
}
