pub mod api;
pub mod auth;
pub mod rate_limiter;
pub mod retry;

pub use api::{RedditClient, RedditListing, RedditPostData};
pub use auth::AppToken;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use retry::{with_retry, RetryConfig};
