use thiserror::Error;

use crate::types::Provider;

/// Configuration problems detected while reading the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(String),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },

    #[error("failed to load environment: {0}")]
    Load(String),
}

/// Failures of the token lifecycle.
///
/// A missing token is not an error: see [`crate::types::TokenLookup::NotConnected`].
#[derive(Error, Debug)]
pub enum TokenError {
    /// The provider rejected an exchange, refresh or API call.
    #[error("{provider} rejected the request with status {status}: {body}")]
    UpstreamAuth {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// A non-auth failure returned by the provider API.
    #[error("{provider} API error {status}: {body}")]
    UpstreamApi {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The provider could not be reached.
    #[error("failed to reach {provider}: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with success but the body was unusable.
    #[error("malformed token response from {provider}: {reason}")]
    MalformedGrant { provider: Provider, reason: String },

    #[error("token storage failure: {0}")]
    Persistence(String),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TokenError {
    /// Whether the caller should ask the user to authorize the integration again.
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            TokenError::UpstreamAuth { .. } | TokenError::MalformedGrant { .. }
        )
    }
}

impl From<rusqlite::Error> for TokenError {
    fn from(error: rusqlite::Error) -> Self {
        tracing::error!("sqlite error: {error}");
        TokenError::Persistence(error.to_string())
    }
}

impl From<std::io::Error> for TokenError {
    fn from(error: std::io::Error) -> Self {
        tracing::error!("token file error: {error}");
        TokenError::Persistence(error.to_string())
    }
}

impl From<serde_json::Error> for TokenError {
    fn from(error: serde_json::Error) -> Self {
        TokenError::Persistence(format!("failed to (de)serialize tokens: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_rejection_requires_reauthorization() {
        let err = TokenError::UpstreamAuth {
            provider: Provider::Music,
            status: 400,
            body: r#"{"error":"invalid_grant"}"#.to_string(),
        };
        assert!(err.requires_reauthorization());
        assert!(err.to_string().contains("invalid_grant"));

        let err = TokenError::Persistence("disk full".to_string());
        assert!(!err.requires_reauthorization());
    }
}
