use std::sync::Arc;

use crate::{
    error::TokenError,
    providers::{ProviderRegistry, TokenEndpoint},
    types::{ConnectionStatus, Provider, TokenLookup, TokenRecord, TokenState, UserId},
};

use super::{Clock, RefreshExecutor, SystemClock, TokenStore, TokenValidator};

/// Entry point of the token lifecycle for both integrations.
///
/// Every call is keyed by an explicit `(provider, user_id)` pair. Concurrent
/// callers are not serialized: two requests crossing the grace window at the
/// same time may both refresh.
pub struct TokenManager {
    store: Arc<dyn TokenStore>,
    providers: ProviderRegistry,
    validator: TokenValidator,
    executor: RefreshExecutor,
    clock: Arc<dyn Clock>,
}

impl TokenManager {
    pub fn new(
        store: Arc<dyn TokenStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        providers: ProviderRegistry,
    ) -> Self {
        Self::with_clock(store, endpoint, providers, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn TokenStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        providers: ProviderRegistry,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let executor = RefreshExecutor::new(Arc::clone(&store), endpoint, Arc::clone(&clock));
        Self {
            store,
            providers,
            validator: TokenValidator::default(),
            executor,
            clock,
        }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Returns an access token that stays valid for at least the grace window.
    ///
    /// A token inside the window is refreshed synchronously first, and the new
    /// pair is persisted before it is returned.
    ///
    /// # Returns
    ///
    /// - `Ok(TokenLookup::Ready(token))` - token ready for a bearer header
    /// - `Ok(TokenLookup::NotConnected)` - nothing stored for the pair
    ///
    /// # Errors
    ///
    /// Refresh failures ([`TokenError::UpstreamAuth`], [`TokenError::Transport`],
    /// [`TokenError::MalformedGrant`]) and storage failures are returned
    /// unchanged; they never turn into `NotConnected`.
    pub async fn get_usable_token(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<TokenLookup, TokenError> {
        let Some(record) = self.store.load(provider, user_id).await? else {
            tracing::debug!(%provider, %user_id, "no stored token");
            return Ok(TokenLookup::NotConnected);
        };

        if !self.validator.needs_refresh(&record, self.clock.now()) {
            return Ok(TokenLookup::Ready(record.access_token));
        }

        let config = self.providers.get(provider)?;
        let refreshed = self.executor.refresh(config, &record).await?;
        Ok(TokenLookup::Ready(refreshed.access_token))
    }

    /// Refreshes regardless of the remaining lifetime.
    pub async fn force_refresh(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<TokenLookup, TokenError> {
        let Some(record) = self.store.load(provider, user_id).await? else {
            return Ok(TokenLookup::NotConnected);
        };

        let config = self.providers.get(provider)?;
        let refreshed = self.executor.refresh(config, &record).await?;
        Ok(TokenLookup::Ready(refreshed.access_token))
    }

    /// Completes the OAuth callback: exchanges `code` and stores the pair.
    pub async fn connect(
        &self,
        provider: Provider,
        user_id: &UserId,
        code: &str,
    ) -> Result<TokenRecord, TokenError> {
        let config = self.providers.get(provider)?;
        self.executor.exchange(config, user_id, code).await
    }

    /// Builds the URL that starts the OAuth flow for `provider`.
    pub fn authorize_url(&self, provider: Provider, state: &str) -> Result<String, TokenError> {
        Ok(self.providers.get(provider)?.authorize_url(state)?)
    }

    /// Reports the stored token's state without contacting the provider.
    pub async fn status(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<ConnectionStatus, TokenError> {
        let record = self.store.load(provider, user_id).await?;
        let now = self.clock.now();
        let state = self.validator.classify(record.as_ref(), now);

        Ok(ConnectionStatus {
            provider,
            connected: matches!(state, TokenState::Valid | TokenState::Expiring),
            state,
            expires_at: record.as_ref().map(|r| r.expires_at),
            expires_in_seconds: record.as_ref().map(|r| (r.expires_at - now).num_seconds()),
        })
    }

    /// Forgets the stored pair. Disconnecting twice is fine.
    pub async fn disconnect(&self, provider: Provider, user_id: &UserId) -> Result<(), TokenError> {
        self.store.delete(provider, user_id).await?;
        tracing::info!(%provider, %user_id, "integration disconnected");
        Ok(())
    }
}
