use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

use crate::{
    config,
    error::TokenError,
    management::{TokenManager, open_store},
    providers::{self, HttpTokenEndpoint, ProviderClient, ProviderRegistry},
    types::{Provider, UserId},
};

/// How long an issued `state` value stays redeemable.
pub const PENDING_TTL: Duration = Duration::from_secs(600);

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TokenManager>,
    pub client: ProviderClient,
    /// Account every request acts for.
    pub owner: UserId,
    pub pending: PendingAuthorizations,
}

impl AppState {
    pub fn new(manager: Arc<TokenManager>, client: ProviderClient, owner: UserId) -> Self {
        Self {
            manager,
            client,
            owner,
            pending: PendingAuthorizations::default(),
        }
    }

    /// Wires the store, providers and HTTP client from the environment.
    ///
    /// `owner` overrides `HOMEBASE_OWNER` when given.
    pub fn from_env(owner: Option<UserId>) -> Result<Self, TokenError> {
        let owner = match owner {
            Some(owner) => owner,
            None => config::owner_id()?,
        };

        let store = open_store(config::token_store_kind()?)?;
        let http = providers::http_client(config::http_connect_timeout()?)?;
        let endpoint = Arc::new(HttpTokenEndpoint::new(http.clone()));
        let manager = Arc::new(TokenManager::new(
            store,
            endpoint,
            ProviderRegistry::from_env(),
        ));
        let client = ProviderClient::new(http, Arc::clone(&manager));

        Ok(Self::new(manager, client, owner))
    }
}

/// OAuth `state` values handed out by `/api/{provider}/auth`, each redeemable once.
#[derive(Clone, Default)]
pub struct PendingAuthorizations {
    inner: Arc<Mutex<HashMap<String, (Provider, Instant)>>>,
}

impl PendingAuthorizations {
    pub async fn insert(&self, state: String, provider: Provider) {
        let mut pending = self.inner.lock().await;
        pending.retain(|_, (_, issued)| issued.elapsed() < PENDING_TTL);
        pending.insert(state, (provider, Instant::now()));
    }

    /// Consumes `state`. True only when it was issued for `provider` and has not expired.
    pub async fn take(&self, state: &str, provider: Provider) -> bool {
        match self.inner.lock().await.remove(state) {
            Some((issued_for, issued)) => {
                issued_for == provider && issued.elapsed() < PENDING_TTL
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_is_single_use_and_provider_bound() {
        let pending = PendingAuthorizations::default();
        pending.insert("abc".to_string(), Provider::Music).await;
        pending.insert("def".to_string(), Provider::Music).await;

        assert!(pending.take("abc", Provider::Music).await);
        assert!(!pending.take("abc", Provider::Music).await);
        assert!(!pending.take("def", Provider::Fitness).await);
        assert!(!pending.take("nope", Provider::Music).await);
    }
}
