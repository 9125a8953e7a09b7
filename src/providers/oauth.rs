use async_trait::async_trait;
use reqwest::Client;

use crate::{error::TokenError, types::TokenGrant, utils};

use super::ProviderConfig;

/// The token endpoint of an OAuth 2.0 provider.
///
/// [`HttpTokenEndpoint`] talks to the real service; tests substitute doubles
/// that script the provider's answers.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Exchanges an authorization code (`grant_type=authorization_code`).
    async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<TokenGrant, TokenError>;

    /// Mints a new access token (`grant_type=refresh_token`).
    async fn refresh(
        &self,
        config: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenGrant, TokenError>;
}

/// Form-encoded token requests over reqwest.
#[derive(Debug, Clone)]
pub struct HttpTokenEndpoint {
    client: Client,
}

impl HttpTokenEndpoint {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn post_form(
        &self,
        config: &ProviderConfig,
        form: &[(&str, &str)],
    ) -> Result<TokenGrant, TokenError> {
        let provider = config.provider;
        let transport = |source| TokenError::Transport { provider, source };

        let res = self
            .client
            .post(&config.token_url)
            .form(form)
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        let body = res.text().await.map_err(transport)?;

        if !status.is_success() {
            tracing::warn!(%provider, status = status.as_u16(), "token endpoint rejected request");
            return Err(TokenError::UpstreamAuth {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        let grant: TokenGrant =
            serde_json::from_str(&body).map_err(|e| TokenError::MalformedGrant {
                provider,
                reason: e.to_string(),
            })?;

        if grant.access_token.is_empty() {
            return Err(TokenError::MalformedGrant {
                provider,
                reason: "access_token is empty".to_string(),
            });
        }

        tracing::debug!(
            %provider,
            access = %utils::fingerprint(&grant.access_token),
            rotated = grant.refresh_token.is_some(),
            "token endpoint issued grant"
        );
        Ok(grant)
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    async fn exchange_code(
        &self,
        config: &ProviderConfig,
        code: &str,
    ) -> Result<TokenGrant, TokenError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
        ];
        if config.exchange_sends_redirect_uri {
            form.push(("redirect_uri", config.redirect_uri.as_str()));
        }

        self.post_form(config, &form).await
    }

    async fn refresh(
        &self,
        config: &ProviderConfig,
        refresh_token: &str,
    ) -> Result<TokenGrant, TokenError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
        ];

        self.post_form(config, &form).await
    }
}
