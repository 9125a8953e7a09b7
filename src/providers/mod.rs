//! # Provider Integration Module
//!
//! This module describes the two OAuth 2.0 services the website talks to and
//! implements the HTTP side of their token lifecycle. Both services are driven by
//! the same code; everything that differs between them lives in a
//! [`ProviderConfig`] record.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API / CLI
//!          ↓
//! TokenManager (management)
//!          ↓
//! Provider Integration Layer
//!     ├── ProviderConfig   (endpoints, credentials, quirks)
//!     ├── TokenEndpoint    (code exchange, refresh)
//!     ├── ProviderClient   (authenticated API calls)
//!     ├── fitness          (Strava reads)
//!     └── music            (Spotify reads)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//! ```
//!
//! ## Provider Quirks
//!
//! | Quirk                              | fitness (Strava)            | music (Spotify)          |
//! |------------------------------------|-----------------------------|--------------------------|
//! | Scope separator                    | `,`                         | space                    |
//! | Extra authorize parameters         | `approval_prompt=auto`      | `show_dialog=true`       |
//! | `redirect_uri` on code exchange    | no                          | yes                      |
//! | Refresh token in refresh response  | always rotated              | may be omitted           |
//!
//! ## Configuration Integration
//!
//! [`ProviderConfig::from_env`] reads `<PREFIX>_CLIENT_ID`, `<PREFIX>_CLIENT_SECRET`,
//! `<PREFIX>_REDIRECT_URI` and optional endpoint overrides (`<PREFIX>_AUTH_URL`,
//! `<PREFIX>_TOKEN_URL`, `<PREFIX>_API_URL`) where the prefix is `STRAVA` or
//! `SPOTIFY`.

pub mod client;
pub mod fitness;
pub mod music;
pub mod oauth;

use std::{collections::HashMap, time::Duration};

use reqwest::{Client, Url};

use crate::{
    config,
    error::{ConfigError, TokenError},
    types::Provider,
};

pub use client::{ProviderClient, Upstream};
pub use oauth::{HttpTokenEndpoint, TokenEndpoint};

/// How a provider treats the refresh token when it answers a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenPolicy {
    /// The response may omit `refresh_token`; keep the one we already have.
    RetainPrevious,
    /// Every response carries a refresh token; a missing one is a malformed grant.
    AlwaysRotated,
}

impl RefreshTokenPolicy {
    /// Picks the refresh token to persist after a refresh.
    pub fn resolve(
        &self,
        provider: Provider,
        previous: &str,
        issued: Option<&str>,
    ) -> Result<String, TokenError> {
        match (issued.filter(|t| !t.is_empty()), self) {
            (Some(token), _) => Ok(token.to_string()),
            (None, RefreshTokenPolicy::RetainPrevious) => Ok(previous.to_string()),
            (None, RefreshTokenPolicy::AlwaysRotated) => Err(TokenError::MalformedGrant {
                provider,
                reason: "refresh response is missing refresh_token".to_string(),
            }),
        }
    }
}

/// Endpoints, credentials and quirks of one OAuth provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scopes: Vec<String>,
    pub scope_separator: &'static str,
    pub extra_authorize_params: Vec<(&'static str, &'static str)>,
    pub refresh_policy: RefreshTokenPolicy,
    pub exchange_sends_redirect_uri: bool,
}

impl ProviderConfig {
    /// Builds a config with the provider's public endpoints and defaults.
    pub fn new(
        provider: Provider,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        let (client_id, client_secret, redirect_uri) =
            (client_id.into(), client_secret.into(), redirect_uri.into());

        match provider {
            Provider::Fitness => Self {
                provider,
                client_id,
                client_secret,
                redirect_uri,
                authorize_url: "https://www.strava.com/oauth/authorize".to_string(),
                token_url: "https://www.strava.com/oauth/token".to_string(),
                api_url: "https://www.strava.com/api/v3".to_string(),
                scopes: vec![
                    "read".to_string(),
                    "activity:read_all".to_string(),
                    "profile:read_all".to_string(),
                ],
                scope_separator: ",",
                extra_authorize_params: vec![("approval_prompt", "auto")],
                refresh_policy: RefreshTokenPolicy::AlwaysRotated,
                exchange_sends_redirect_uri: false,
            },
            Provider::Music => Self {
                provider,
                client_id,
                client_secret,
                redirect_uri,
                authorize_url: "https://accounts.spotify.com/authorize".to_string(),
                token_url: "https://accounts.spotify.com/api/token".to_string(),
                api_url: "https://api.spotify.com/v1".to_string(),
                scopes: [
                    "user-read-private",
                    "user-read-email",
                    "user-top-read",
                    "user-read-recently-played",
                    "user-read-playback-state",
                    "user-read-currently-playing",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
                scope_separator: " ",
                extra_authorize_params: vec![("show_dialog", "true")],
                refresh_policy: RefreshTokenPolicy::RetainPrevious,
                exchange_sends_redirect_uri: true,
            },
        }
    }

    /// Points the token endpoint and API base at other URLs (fake providers, proxies).
    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self.api_url = api_url.into();
        self
    }

    /// Reads the provider's settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when the client id or secret is not set.
    pub fn from_env(provider: Provider) -> Result<Self, ConfigError> {
        let prefix = provider.env_prefix();
        let var = |suffix: &str| format!("{}_{}", prefix, suffix);

        let client_id = config::required(&var("CLIENT_ID"))?;
        let client_secret = config::required(&var("CLIENT_SECRET"))?;
        let redirect_uri = config::optional(&var("REDIRECT_URI")).unwrap_or_else(|| {
            format!(
                "http://localhost:8000/api/{}/callback",
                provider.service_name().to_ascii_lowercase()
            )
        });

        let mut cfg = Self::new(provider, client_id, client_secret, redirect_uri);
        if let Some(url) = config::optional(&var("AUTH_URL")) {
            cfg.authorize_url = url;
        }
        if let Some(url) = config::optional(&var("TOKEN_URL")) {
            cfg.token_url = url;
        }
        if let Some(url) = config::optional(&var("API_URL")) {
            cfg.api_url = url;
        }
        Ok(cfg)
    }

    /// Builds the URL the user is sent to in order to grant access.
    ///
    /// Query parameters are percent-encoded, so scopes with spaces or commas
    /// survive intact.
    pub fn authorize_url(&self, state: &str) -> Result<String, ConfigError> {
        let scope = self.scopes.join(self.scope_separator);
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", scope.as_str()),
            ("state", state),
        ];
        params.extend(self.extra_authorize_params.iter().copied());

        Url::parse_with_params(&self.authorize_url, &params)
            .map(|url| url.to_string())
            .map_err(|e| ConfigError::Invalid {
                name: format!("{}_AUTH_URL", self.provider.env_prefix()),
                reason: e.to_string(),
            })
    }
}

/// Configured providers, keyed by [`Provider`].
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    configs: HashMap<Provider, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, config: ProviderConfig) -> Self {
        self.configs.insert(config.provider, config);
        self
    }

    /// Loads every provider whose credentials are present in the environment.
    ///
    /// Unconfigured providers are skipped with a warning; calls needing them
    /// fail later with a configuration error.
    pub fn from_env() -> Self {
        let mut registry = Self::new();
        for provider in Provider::ALL {
            match ProviderConfig::from_env(provider) {
                Ok(cfg) => registry = registry.with(cfg),
                Err(e) => tracing::warn!(%provider, "provider not configured: {e}"),
            }
        }
        registry
    }

    pub fn get(&self, provider: Provider) -> Result<&ProviderConfig, ConfigError> {
        self.configs
            .get(&provider)
            .ok_or_else(|| ConfigError::Missing(format!("{}_CLIENT_ID", provider.env_prefix())))
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.configs.contains_key(&provider)
    }
}

/// Shared HTTP client for token endpoints and provider APIs.
pub fn http_client(connect_timeout: Duration) -> Result<Client, TokenError> {
    Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            TokenError::Config(ConfigError::Invalid {
                name: "HTTP_CONNECT_TIMEOUT_SECS".to_string(),
                reason: e.to_string(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn music_authorize_url_carries_space_separated_scopes() {
        let cfg = ProviderConfig::new(
            Provider::Music,
            "client",
            "secret",
            "http://localhost:8000/api/spotify/callback",
        );
        let url = Url::parse(&cfg.authorize_url("xyz").unwrap()).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("accounts.spotify.com"));
        assert_eq!(params["client_id"], "client");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], "xyz");
        assert_eq!(params["show_dialog"], "true");
        assert!(params["scope"].contains("user-top-read user-read-recently-played"));
    }

    #[test]
    fn fitness_authorize_url_uses_comma_scopes() {
        let cfg = ProviderConfig::new(Provider::Fitness, "42", "s", "http://localhost/cb");
        let url = Url::parse(&cfg.authorize_url("abc").unwrap()).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params["scope"], "read,activity:read_all,profile:read_all");
        assert_eq!(params["redirect_uri"], "http://localhost/cb");
        assert_eq!(params["approval_prompt"], "auto");
    }

    #[test]
    fn refresh_policy_per_provider() {
        let music = RefreshTokenPolicy::RetainPrevious;
        assert_eq!(
            music.resolve(Provider::Music, "old", None).unwrap(),
            "old".to_string()
        );
        assert_eq!(
            music.resolve(Provider::Music, "old", Some("")).unwrap(),
            "old".to_string()
        );
        assert_eq!(
            music.resolve(Provider::Music, "old", Some("new")).unwrap(),
            "new".to_string()
        );

        let fitness = RefreshTokenPolicy::AlwaysRotated;
        assert!(matches!(
            fitness.resolve(Provider::Fitness, "old", None),
            Err(TokenError::MalformedGrant { .. })
        ));
        assert_eq!(
            fitness.resolve(Provider::Fitness, "old", Some("new")).unwrap(),
            "new".to_string()
        );
    }

    #[test]
    fn registry_reports_unconfigured_provider() {
        let registry = ProviderRegistry::new().with(ProviderConfig::new(
            Provider::Music,
            "id",
            "secret",
            "http://localhost/cb",
        ));
        assert!(registry.is_configured(Provider::Music));
        assert_eq!(
            registry.get(Provider::Fitness).unwrap_err(),
            ConfigError::Missing("STRAVA_CLIENT_ID".to_string())
        );
    }
}
