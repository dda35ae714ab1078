use thiserror::Error;

/// Errors from a single chat-completion provider call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("provider returned no choices")]
    EmptyResponse,

    #[error("provider misconfigured: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// HTTP status carried by the error, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for an explicit HTTP 429.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// User-facing errors returned by the failover router.
///
/// The `Display` text is safe to hand to end users; provider details are
/// only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    /// Primary exhausted and the caller is not eligible for the fallback.
    #[error("Service busy. Please try again later or upgrade for priority access.")]
    QuotaExceeded,

    /// Both stages failed, or the fallback is not configured.
    #[error("AI service temporarily unavailable. Please try again later.")]
    Unavailable,

    #[error("Request was cancelled.")]
    Cancelled,
}

/// Errors from operator key-control actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyPoolError {
    #[error("no key in slot '{identifier}'")]
    KeyNotFound { identifier: String },
}

/// Errors from repository operations (used by trait definitions in the core crate).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_status() {
        let err = ProviderError::Http {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.status(), Some(429));
        assert!(err.is_rate_limited());
        assert_eq!(err.to_string(), "HTTP 429: slow down");
        assert_eq!(ProviderError::Timeout.status(), None);
    }

    #[test]
    fn test_router_error_messages_are_user_facing() {
        assert_eq!(
            RouterError::Unavailable.to_string(),
            "AI service temporarily unavailable. Please try again later."
        );
        assert_eq!(
            RouterError::QuotaExceeded.to_string(),
            "Service busy. Please try again later or upgrade for priority access."
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
