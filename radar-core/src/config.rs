use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://compliance_radar.db";

/// Runtime configuration. Defaults match the shipped deployment; a TOML file
/// overrides them, and Reddit credentials are taken from the environment
/// last so secrets stay out of config files.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    /// Lookback window for collection runs, in days
    pub days_back: i64,
    /// Listing page size requested per subreddit
    pub limit_per_subreddit: u32,
    /// Relevance gate threshold handed to the tagger
    pub min_tags: usize,
    pub subreddits: Vec<String>,
    pub feeds: Vec<FeedConfig>,
    pub reddit: RedditCredentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl Default for RedditCredentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            user_agent: "compliance-radar/1.0".to_string(),
        }
    }
}

/// A monitored RSS/Atom feed. `post_tags` carries the optional per-feed
/// post-processing rules applied after the shared tagger runs.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub post_tags: Option<UrlTagRules>,
}

/// Provenance tag plus ordered URL-path rules; the first rule whose pattern
/// occurs in the lowercased link wins, later rules are not consulted.
#[derive(Debug, Clone, Deserialize)]
pub struct UrlTagRules {
    pub provenance: String,
    #[serde(default)]
    pub rules: Vec<PathRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathRule {
    pub patterns: Vec<String>,
    pub tag: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            days_back: 14,
            limit_per_subreddit: 100,
            min_tags: 1,
            subreddits: vec!["IndiaTax".to_string(), "IndiaStartups".to_string()],
            feeds: default_feeds(),
            reddit: RedditCredentials::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw =
                    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    })?;
                toml::from_str(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        debug!(
            "Configuration loaded: {} subreddits, {} feeds, {} day window",
            config.subreddits.len(),
            config.feeds.len(),
            config.days_back
        );
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(client_id) = std::env::var("REDDIT_CLIENT_ID") {
            self.reddit.client_id = client_id;
        }
        if let Ok(client_secret) = std::env::var("REDDIT_CLIENT_SECRET") {
            self.reddit.client_secret = client_secret;
        }
        if let Ok(user_agent) = std::env::var("REDDIT_USER_AGENT") {
            self.reddit.user_agent = user_agent;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.days_back <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "days_back".to_string(),
                value: self.days_back.to_string(),
            });
        }
        if self.min_tags == 0 {
            return Err(ConfigError::InvalidValue {
                field: "min_tags".to_string(),
                value: self.min_tags.to_string(),
            });
        }
        Ok(())
    }

    pub fn has_reddit_credentials(&self) -> bool {
        !self.reddit.client_id.is_empty() && !self.reddit.client_secret.is_empty()
    }
}

fn default_feeds() -> Vec<FeedConfig> {
    vec![
        FeedConfig {
            name: "TaxGuru".to_string(),
            url: "https://taxguru.in/feed".to_string(),
            post_tags: None,
        },
        FeedConfig {
            name: "Income Tax India".to_string(),
            url: "https://incometaxindia.gov.in/_layouts/15/Dit/Pages/Rss.aspx?List=Latest+Tax+Updates"
                .to_string(),
            post_tags: None,
        },
        FeedConfig {
            name: "SEBI".to_string(),
            url: "https://www.sebi.gov.in/sebirss.xml".to_string(),
            post_tags: Some(sebi_tag_rules()),
        },
    ]
}

/// Document-type tagging for SEBI permalinks, keyed off URL path segments.
pub fn sebi_tag_rules() -> UrlTagRules {
    UrlTagRules {
        provenance: "SEBI".to_string(),
        rules: vec![
            PathRule {
                patterns: vec![
                    "/press-releases/".to_string(),
                    "/media-and-notifications/press-releases/".to_string(),
                ],
                tag: "PressRelease".to_string(),
            },
            PathRule {
                patterns: vec!["/circulars/".to_string(), "/legal/circulars/".to_string()],
                tag: "Circular".to_string(),
            },
            PathRule {
                patterns: vec![
                    "/orders/".to_string(),
                    "/legal/orders/".to_string(),
                    "/enforcement/orders/".to_string(),
                ],
                tag: "Order".to_string(),
            },
            PathRule {
                patterns: vec![
                    "/regulations/".to_string(),
                    "/legal/regulations/".to_string(),
                ],
                tag: "Regulation".to_string(),
            },
            PathRule {
                patterns: vec!["/enforcement/".to_string()],
                tag: "Enforcement".to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.days_back, 14);
        assert_eq!(config.limit_per_subreddit, 100);
        assert_eq!(config.min_tags, 1);
        assert_eq!(config.subreddits, vec!["IndiaTax", "IndiaStartups"]);
        assert_eq!(config.feeds.len(), 3);
        assert!(!config.has_reddit_credentials());
    }

    #[test]
    fn test_sebi_feed_carries_tag_rules() {
        let config = AppConfig::default();

        let sebi = config.feeds.iter().find(|f| f.name == "SEBI").unwrap();
        let rules = sebi.post_tags.as_ref().unwrap();
        assert_eq!(rules.provenance, "SEBI");
        assert_eq!(rules.rules.first().unwrap().tag, "PressRelease");
    }

    #[test]
    fn test_toml_overrides() {
        let raw = r#"
            days_back = 7
            subreddits = ["IndiaTax"]

            [[feeds]]
            name = "TaxGuru"
            url = "https://taxguru.in/feed"
        "#;

        let config: AppConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.days_back, 7);
        assert_eq!(config.subreddits, vec!["IndiaTax"]);
        assert_eq!(config.feeds.len(), 1);
        assert!(config.feeds[0].post_tags.is_none());
        // Untouched fields keep their defaults
        assert_eq!(config.limit_per_subreddit, 100);
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let mut config = AppConfig::default();
        config.days_back = 0;
        assert!(config.validate().is_err());
    }
}
