use feed_rs::model::Feed;
use feed_rs::parser;
use radar_core::{CoreError, FeedConfig, RawItem, SourceApiError};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
pub struct FeedClient {
    http_client: Client,
}

impl FeedClient {
    pub fn new(user_agent: &str) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self { http_client })
    }

    /// Fetch and parse one configured feed into raw pipeline items.
    pub async fn fetch_entries(&self, feed: &FeedConfig) -> Result<Vec<RawItem>, CoreError> {
        let url = Url::parse(&feed.url).map_err(|e| SourceApiError::MalformedFeed {
            feed: feed.name.clone(),
            details: format!("invalid feed url: {}", e),
        })?;

        debug!("Fetching feed {} from {}", feed.name, url);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(if status.is_server_error() {
                SourceApiError::ServerError {
                    status_code: status.as_u16(),
                }
            } else {
                SourceApiError::InvalidResponse {
                    details: format!("feed {} returned status {}", feed.name, status),
                }
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(CoreError::Network)?;
        let parsed = parser::parse(bytes.as_ref()).map_err(|e| SourceApiError::MalformedFeed {
            feed: feed.name.clone(),
            details: e.to_string(),
        })?;

        let items = entries_to_items(parsed);
        info!("Parsed {} entries from feed {}", items.len(), feed.name);
        Ok(items)
    }
}

/// Map parsed entries to the pipeline's raw item shape. Missing publish
/// dates stay None here; the pipeline applies its "assume recent" fallback.
pub fn entries_to_items(feed: Feed) -> Vec<RawItem> {
    feed.entries
        .into_iter()
        .map(|entry| {
            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let body = entry
                .summary
                .map(|t| t.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let permalink = entry
                .links
                .first()
                .map(|link| link.href.clone())
                .unwrap_or_default();
            let author = entry
                .authors
                .first()
                .map(|person| person.name.clone())
                .filter(|name| !name.is_empty());

            RawItem {
                native_id: None,
                title: title.trim().to_string(),
                body,
                author,
                permalink,
                score: None, // feeds carry no ranking signal
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect()
}

fn map_send_error(e: reqwest::Error) -> CoreError {
    if e.is_timeout() {
        SourceApiError::RequestTimeout.into()
    } else {
        CoreError::Network(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>SEBI</title>
    <link>https://www.sebi.gov.in</link>
    <item>
      <title>Circular on disclosure norms</title>
      <description>Updated disclosure requirements for listed entities</description>
      <link>https://www.sebi.gov.in/legal/circulars/jan-2024/disclosure.html</link>
      <pubDate>Mon, 08 Jan 2024 10:00:00 +0530</pubDate>
    </item>
    <item>
      <title>  Undated notice  </title>
      <description>No publish date on this one</description>
      <link>https://www.sebi.gov.in/enforcement/notice.html</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_entries_from_rss() {
        let feed = parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let items = entries_to_items(feed);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Circular on disclosure norms");
        assert_eq!(
            items[0].permalink,
            "https://www.sebi.gov.in/legal/circulars/jan-2024/disclosure.html"
        );
        assert_eq!(
            items[0].body,
            "Updated disclosure requirements for listed entities"
        );
        assert!(items[0].published_at.is_some());
        assert_eq!(items[0].score, None);
        assert!(items[0].native_id.is_none());
    }

    #[test]
    fn test_missing_publish_date_stays_none() {
        let feed = parser::parse(SAMPLE_RSS.as_bytes()).unwrap();
        let items = entries_to_items(feed);

        // Title whitespace is trimmed and the missing date is left for the
        // pipeline to fill in
        assert_eq!(items[1].title, "Undated notice");
        assert!(items[1].published_at.is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let client = FeedClient::new("compliance-radar/1.0 test").unwrap();
        let feed = FeedConfig {
            name: "Broken".to_string(),
            url: "not a url".to_string(),
            post_tags: None,
        };

        let result = client.fetch_entries(&feed).await;
        assert!(matches!(
            result,
            Err(CoreError::Source(SourceApiError::MalformedFeed { .. }))
        ));
    }
}
