use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use collector::Collector;
use database::Database;
use insights::DashboardFilter;
use radar_core::AppConfig;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "compliance-radar",
    about = "Tracks compliance pain signals from Indian regulatory forums and news feeds",
    version
)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull new posts from all configured sources into the store
    Collect {
        /// Override the configured lookback window, in days
        #[arg(long)]
        days_back: Option<i64>,
        /// Override the per-subreddit listing size
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Print aggregate statistics for the whole store
    Stats,
    /// Render a text dashboard of filtered posts and aggregates
    Dashboard {
        /// Lookback window for the dashboard, in days
        #[arg(long, default_value_t = 14)]
        days_back: i64,
        /// Filter by source label, e.g. Reddit or SEBI
        #[arg(long)]
        source: Option<String>,
        /// Comma-delimited tag filter (OR semantics)
        #[arg(long)]
        tags: Option<String>,
        /// Case-insensitive substring match over title and text
        #[arg(long)]
        search: Option<String>,
        /// Number of rows in the top-tags table
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
            |_| {
                "compliance_radar=info,collector=info,database=info,reddit_client=info,rss_client=info"
                    .into()
            },
        ))
        .init();

    let cli = Cli::parse();
    let config =
        AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Collect { days_back, limit } => collect(config, days_back, limit).await,
        Commands::Stats => stats(config).await,
        Commands::Dashboard {
            days_back,
            source,
            tags,
            search,
            top,
        } => dashboard(config, days_back, source, tags, search, top).await,
    }
}

async fn collect(
    mut config: AppConfig,
    days_back: Option<i64>,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    if let Some(days_back) = days_back {
        config.days_back = days_back;
    }
    if let Some(limit) = limit {
        config.limit_per_subreddit = limit;
    }

    info!("Starting collection run");

    // An uninitializable store is fatal; every failure after this point is
    // contained per source
    let db = Database::connect(&config.database_url)
        .await
        .context("failed to open the database")?;
    db.run_migrations()
        .await
        .context("failed to initialize the database schema")?;

    let collector = Collector::new(db.clone(), config);
    let summary = collector.run().await;
    let overall = summary.overall();
    let store = db.stats().await?;

    println!("Collection complete");
    println!(
        "  Reddit:  {} new, {} skipped, {} processed, {} errors",
        summary.reddit.new, summary.reddit.skipped, summary.reddit.total, summary.reddit.errors
    );
    println!(
        "  Feeds:   {} new, {} skipped, {} processed, {} errors",
        summary.feeds.new, summary.feeds.skipped, summary.feeds.total, summary.feeds.errors
    );
    println!(
        "  Overall: {} new, {} skipped, {} processed, {} errors",
        overall.new, overall.skipped, overall.total, overall.errors
    );
    println!();
    println!(
        "Store totals: {} posts, {} authors, {} sources",
        store.total_posts, store.unique_authors, store.sources
    );
    if let (Some(earliest), Some(latest)) = (store.earliest_post, store.latest_post) {
        println!(
            "  Date range: {} to {}",
            earliest.format("%Y-%m-%d %H:%M"),
            latest.format("%Y-%m-%d %H:%M")
        );
    }

    if overall.new == 0 {
        // Normal when re-polling frequently; still exit 0
        println!("No new posts collected this run.");
    }

    Ok(())
}

async fn stats(config: AppConfig) -> anyhow::Result<()> {
    if store_is_missing(&config) {
        println!("No database found. Run `compliance-radar collect` first.");
        return Ok(());
    }

    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;
    let store = db.stats().await?;

    println!("Total posts:    {}", store.total_posts);
    println!("Unique authors: {}", store.unique_authors);
    println!("Sources:        {}", store.sources);
    match (store.earliest_post, store.latest_post) {
        (Some(earliest), Some(latest)) => {
            println!(
                "Date range:     {} to {}",
                earliest.format("%Y-%m-%d %H:%M"),
                latest.format("%Y-%m-%d %H:%M")
            );
        }
        _ => println!("Date range:     (empty store)"),
    }

    Ok(())
}

async fn dashboard(
    config: AppConfig,
    days_back: i64,
    source: Option<String>,
    tags: Option<String>,
    search: Option<String>,
    top: usize,
) -> anyhow::Result<()> {
    if store_is_missing(&config) {
        println!("No database found. Run `compliance-radar collect` first.");
        return Ok(());
    }

    let db = Database::connect(&config.database_url).await?;
    db.run_migrations().await?;

    let now = Utc::now();
    let filter = DashboardFilter {
        start: Some(now - Duration::days(days_back)),
        end: Some(now),
        source,
        text: search,
        tags,
    };
    let posts = insights::filtered_posts(&db, &filter).await?;

    let authors: HashSet<&str> = posts.iter().map(|p| p.author.as_str()).collect();
    let sources: HashSet<&str> = posts.iter().map(|p| p.source.as_str()).collect();

    println!("Compliance Radar - last {} days", days_back);
    println!();
    println!("Posts:          {}", posts.len());
    println!("Unique authors: {}", authors.len());
    println!("Sources:        {}", sources.len());
    println!("Pain signal:    {:.1}%", insights::pain_percentage(&posts));

    if posts.is_empty() {
        println!();
        println!("No posts match the selected filters.");
        return Ok(());
    }

    println!();
    println!("Daily mentions:");
    for (date, count) in insights::daily_counts(&posts) {
        println!("  {}  {}", date, count);
    }

    println!();
    println!("Top tags:");
    for (tag, count) in insights::top_tags(&posts, top) {
        println!("  {:<14} {}", tag, count);
    }

    println!();
    println!("Latest posts:");
    for post in posts.iter().take(20) {
        let title: String = post.title.chars().take(80).collect();
        println!(
            "  {}  {:<16} {}  [{}]",
            post.created_at.format("%Y-%m-%d %H:%M"),
            post.source,
            title,
            post.tags.join(", ")
        );
    }

    Ok(())
}

fn store_is_missing(config: &AppConfig) -> bool {
    let path = config
        .database_url
        .strip_prefix("sqlite://")
        .unwrap_or(&config.database_url);
    path != ":memory:" && !std::path::Path::new(path).exists()
}
