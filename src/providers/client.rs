use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::{
    error::TokenError,
    management::TokenManager,
    types::{Provider, TokenLookup, UserId},
};

/// Result of an authenticated upstream read.
#[derive(Debug, Clone, PartialEq)]
pub enum Upstream {
    Json(Value),
    /// The provider answered 204, e.g. nothing is playing.
    NoContent,
    /// No token is stored for the user; the caller should ask for authorization.
    NotConnected,
}

/// Thin REST client that attaches a usable bearer token to every call.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    manager: Arc<TokenManager>,
}

impl ProviderClient {
    pub fn new(http: Client, manager: Arc<TokenManager>) -> Self {
        Self { http, manager }
    }

    /// Issues `GET {api_url}/{path}` for `user_id`, refreshing the token first
    /// when it is inside the grace window.
    ///
    /// # Errors
    ///
    /// - [`TokenError::UpstreamAuth`] when the provider answers 401 or 403
    /// - [`TokenError::UpstreamApi`] for any other non-success status, or a
    ///   success body that is not JSON
    /// - [`TokenError::Transport`] when the provider cannot be reached
    pub async fn get_json(
        &self,
        provider: Provider,
        user_id: &UserId,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Upstream, TokenError> {
        let token = match self.manager.get_usable_token(provider, user_id).await? {
            TokenLookup::Ready(token) => token,
            TokenLookup::NotConnected => return Ok(Upstream::NotConnected),
        };

        let config = self.manager.providers().get(provider)?;
        let url = format!(
            "{}/{}",
            config.api_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        let transport = |source| TokenError::Transport { provider, source };
        let res = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = res.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Upstream::NoContent);
        }

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%provider, %user_id, status = status.as_u16(), path, "upstream call failed");
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TokenError::UpstreamAuth {
                    provider,
                    status: status.as_u16(),
                    body,
                },
                _ => TokenError::UpstreamApi {
                    provider,
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let body = res.text().await.map_err(transport)?;
        let json = serde_json::from_str::<Value>(&body).map_err(|e| {
            tracing::warn!(%provider, path, "upstream answered with invalid JSON");
            TokenError::UpstreamApi {
                provider,
                status: status.as_u16(),
                body: format!("invalid JSON: {}", e),
            }
        })?;
        Ok(Upstream::Json(json))
    }
}
