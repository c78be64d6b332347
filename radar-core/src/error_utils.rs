use crate::error::{CoreError, SourceApiError};
use std::time::Duration;

/// Classification helpers shared by retry logic and run reporting.
pub trait ErrorExt {
    /// Stable machine-readable code for logs and summaries
    fn error_code(&self) -> &'static str;
    /// Whether retrying the failed operation could succeed
    fn is_retryable(&self) -> bool;
    /// Server-mandated wait before the next attempt, if any
    fn retry_after(&self) -> Option<Duration>;
}

impl ErrorExt for CoreError {
    fn error_code(&self) -> &'static str {
        match self {
            CoreError::Source(_) => "SOURCE_API",
            CoreError::Database(_) => "DATABASE",
            CoreError::Config(_) => "CONFIG",
            CoreError::Io(_) => "IO",
            CoreError::Serialization(_) => "SERIALIZATION",
            CoreError::Network(_) => "NETWORK",
            CoreError::InvalidInput { .. } => "INVALID_INPUT",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Source(source) => matches!(
                source,
                SourceApiError::RateLimitExceeded { .. }
                    | SourceApiError::RequestTimeout
                    | SourceApiError::ServerError { .. }
            ),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Source(SourceApiError::RateLimitExceeded { retry_after }) => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }
}
