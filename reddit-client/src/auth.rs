use crate::api::map_send_error;
use radar_core::{CoreError, RedditCredentials, SourceApiError};
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
pub struct AppToken {
    pub access_token: String,
    expires_at: Instant,
}

impl AppToken {
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Application-only OAuth2 grant: no user context, read-only public data.
pub async fn fetch_app_token(
    http_client: &Client,
    credentials: &RedditCredentials,
) -> Result<AppToken, CoreError> {
    if credentials.client_id.is_empty() || credentials.client_secret.is_empty() {
        return Err(SourceApiError::AuthenticationFailed {
            reason: "missing Reddit client credentials".to_string(),
        }
        .into());
    }

    debug!("Requesting application-only Reddit token");
    let response = http_client
        .post(TOKEN_URL)
        .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
        .header("User-Agent", &credentials.user_agent)
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(map_send_error)?;

    if !response.status().is_success() {
        return Err(SourceApiError::AuthenticationFailed {
            reason: format!("token endpoint returned {}", response.status()),
        }
        .into());
    }

    let token: TokenResponse = response.json().await.map_err(|e| {
        SourceApiError::InvalidResponse {
            details: format!("failed to parse token response: {}", e),
        }
    })?;

    info!("Obtained Reddit token valid for {}s", token.expires_in);
    Ok(AppToken {
        access_token: token.access_token,
        // Expire a minute early so a token is never used mid-expiry
        expires_at: Instant::now() + Duration::from_secs(token.expires_in.saturating_sub(60)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credentials_fail_before_any_request() {
        let client = Client::new();
        let credentials = RedditCredentials::default();

        let result = fetch_app_token(&client, &credentials).await;
        assert!(matches!(
            result,
            Err(CoreError::Source(
                SourceApiError::AuthenticationFailed { .. }
            ))
        ));
    }

    #[test]
    fn test_token_expiry() {
        let expired = AppToken {
            access_token: "token".to_string(),
            expires_at: Instant::now() - Duration::from_secs(1),
        };
        assert!(expired.is_expired());

        let valid = AppToken {
            access_token: "token".to_string(),
            expires_at: Instant::now() + Duration::from_secs(3600),
        };
        assert!(!valid.is_expired());
    }
}
