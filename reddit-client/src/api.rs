use crate::auth::{fetch_app_token, AppToken};
use crate::rate_limiter::{RateLimitConfig, RateLimiter};
use crate::retry::{with_retry, RetryConfig};
use chrono::DateTime;
use radar_core::{CoreError, RawItem, RedditCredentials, SourceApiError};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: Option<String>,
    pub permalink: String,
    #[serde(default)]
    pub score: i64,
    pub created_utc: f64,
}

impl From<RedditPostData> for RawItem {
    fn from(post: RedditPostData) -> Self {
        Self {
            native_id: Some(post.id),
            title: post.title,
            body: post.selftext,
            author: post.author,
            permalink: format!("https://reddit.com{}", post.permalink),
            score: Some(post.score),
            published_at: DateTime::from_timestamp(post.created_utc as i64, 0),
        }
    }
}

#[derive(Debug)]
pub struct RedditClient {
    http_client: Client,
    credentials: RedditCredentials,
    rate_limiter: RateLimiter,
    retry: RetryConfig,
    token: Mutex<Option<AppToken>>,
}

impl RedditClient {
    pub fn new(credentials: RedditCredentials) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(&credentials.user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            credentials,
            rate_limiter: RateLimiter::new(RateLimitConfig::reddit_oauth()),
            retry: RetryConfig::reddit(),
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, CoreError> {
        let mut token = self.token.lock().await;
        match token.as_ref() {
            Some(current) if !current.is_expired() => Ok(current.access_token.clone()),
            _ => {
                let fresh = fetch_app_token(&self.http_client, &self.credentials).await?;
                let access_token = fresh.access_token.clone();
                *token = Some(fresh);
                Ok(access_token)
            }
        }
    }

    /// Newest submissions for a subreddit, mapped to raw pipeline items.
    pub async fn fetch_new_posts(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<Vec<RawItem>, CoreError> {
        let operation = format!("r/{}/new", subreddit);
        let listing = with_retry(&self.retry, &operation, || {
            self.fetch_listing(subreddit, limit)
        })
        .await?;

        let items: Vec<RawItem> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into())
            .collect();

        info!("Retrieved {} posts from r/{}", items.len(), subreddit);
        Ok(items)
    }

    async fn fetch_listing(
        &self,
        subreddit: &str,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let access_token = self.access_token().await?;
        self.rate_limiter.acquire().await;

        let url = format!("{}/r/{}/new", REDDIT_API_BASE, subreddit);
        debug!("Fetching {}", url);

        let limit_str = limit.to_string();
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&access_token)
            .query(&[("limit", limit_str.as_str())])
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            error!("Request failed with status {} for r/{}", status, subreddit);

            if status.as_u16() == 401 {
                // Cached token is no longer good; the next call re-authenticates
                *self.token.lock().await = None;
            }

            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);

            return Err(match status.as_u16() {
                429 => SourceApiError::RateLimitExceeded { retry_after },
                401 => SourceApiError::AuthenticationFailed {
                    reason: "access token rejected".to_string(),
                },
                403 => SourceApiError::Forbidden {
                    resource: format!("r/{}", subreddit),
                },
                code if status.is_server_error() => {
                    SourceApiError::ServerError { status_code: code }
                }
                code => SourceApiError::InvalidResponse {
                    details: format!("unexpected status {}", code),
                },
            }
            .into());
        }

        response.json().await.map_err(|e| {
            SourceApiError::InvalidResponse {
                details: format!("failed to parse posts for r/{}: {}", subreddit, e),
            }
            .into()
        })
    }
}

pub(crate) fn map_send_error(e: reqwest::Error) -> CoreError {
    if e.is_timeout() {
        SourceApiError::RequestTimeout.into()
    } else {
        CoreError::Network(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn test_credentials() -> RedditCredentials {
        RedditCredentials {
            client_id: "test_client_id".to_string(),
            client_secret: "test_client_secret".to_string(),
            user_agent: "compliance-radar/1.0 test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = RedditClient::new(test_credentials()).unwrap();

        assert!(client.token.lock().await.is_none());
        assert!(client.rate_limiter.available_tokens().await > 0.0);
    }

    #[test]
    fn test_raw_item_conversion() {
        let post_data = RedditPostData {
            id: "abc123".to_string(),
            title: "GST portal down".to_string(),
            selftext: "unable to login since morning".to_string(),
            author: Some("filing_fury".to_string()),
            permalink: "/r/IndiaTax/comments/abc123".to_string(),
            score: 42,
            created_utc: 1_700_000_000.0,
        };

        let item: RawItem = post_data.into();
        assert_eq!(item.native_id.as_deref(), Some("abc123"));
        assert_eq!(
            item.permalink,
            "https://reddit.com/r/IndiaTax/comments/abc123"
        );
        assert_eq!(item.score, Some(42));
        assert_eq!(
            item.published_at,
            Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
        );
    }

    #[test]
    fn test_listing_deserialization_defaults() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "abc123",
                        "title": "GST portal down",
                        "permalink": "/r/IndiaTax/comments/abc123",
                        "created_utc": 1700000000.0
                    }
                }],
                "after": null
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(raw).unwrap();
        let post = &listing.data.children[0].data;
        assert_eq!(post.author, None);
        assert_eq!(post.selftext, "");
        assert_eq!(post.score, 0);
    }
}
