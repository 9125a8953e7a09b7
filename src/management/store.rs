use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    config::{self, StoreKind},
    error::TokenError,
    types::{Provider, TokenRecord, UserId},
};

use super::{FileTokenStore, SqliteTokenStore};

/// Persistence of [`TokenRecord`]s, one per (provider, user) pair.
///
/// Implementations must make `save` atomic per record: a failed save leaves the
/// previous record in place.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts or replaces the record for `(record.provider, record.user_id)`.
    async fn save(&self, record: &TokenRecord) -> Result<(), TokenError>;

    /// Returns the stored record, or `None` when there is none.
    async fn load(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<Option<TokenRecord>, TokenError>;

    /// Removes the record. Deleting a missing record succeeds.
    async fn delete(&self, provider: Provider, user_id: &UserId) -> Result<(), TokenError>;
}

/// Process-local store; contents vanish on restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: RwLock<HashMap<(Provider, UserId), TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save(&self, record: &TokenRecord) -> Result<(), TokenError> {
        self.records
            .write()
            .await
            .insert((record.provider, record.user_id.clone()), record.clone());
        Ok(())
    }

    async fn load(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<Option<TokenRecord>, TokenError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(provider, user_id.clone()))
            .cloned())
    }

    async fn delete(&self, provider: Provider, user_id: &UserId) -> Result<(), TokenError> {
        self.records
            .write()
            .await
            .remove(&(provider, user_id.clone()));
        Ok(())
    }
}

/// Opens the store selected by `TOKEN_STORE`.
pub fn open_store(kind: StoreKind) -> Result<Arc<dyn TokenStore>, TokenError> {
    let store: Arc<dyn TokenStore> = match kind {
        StoreKind::Sqlite => {
            let path = config::database_path();
            tracing::info!(path = %path.display(), "using sqlite token store");
            Arc::new(SqliteTokenStore::open(&path)?)
        }
        StoreKind::File => {
            let path = config::token_file_path();
            tracing::info!(path = %path.display(), "using file token store");
            Arc::new(FileTokenStore::new(path))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory token store; tokens are lost on restart");
            Arc::new(MemoryTokenStore::new())
        }
    };
    Ok(store)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub(crate) fn record(provider: Provider, user: &str, access: &str) -> TokenRecord {
        TokenRecord {
            provider,
            user_id: UserId::new(user).unwrap(),
            access_token: access.to_string(),
            refresh_token: format!("{}-refresh", access),
            expires_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
                + chrono::Duration::nanoseconds(123_456_789),
            updated_at: Utc.with_ymd_and_hms(2025, 3, 1, 11, 0, 0).unwrap(),
        }
    }

    /// Exercises the store contract; shared by every implementation's tests.
    pub(crate) async fn check_store_contract(store: &dyn TokenStore) {
        let admin = UserId::new("admin").unwrap();
        assert_eq!(store.load(Provider::Music, &admin).await.unwrap(), None);

        let first = record(Provider::Music, "admin", "access-1");
        store.save(&first).await.unwrap();
        assert_eq!(
            store.load(Provider::Music, &admin).await.unwrap(),
            Some(first.clone())
        );

        // Same pair replaces, other provider is independent.
        let second = record(Provider::Music, "admin", "access-2");
        let fitness = record(Provider::Fitness, "admin", "strava-1");
        store.save(&second).await.unwrap();
        store.save(&fitness).await.unwrap();
        assert_eq!(
            store.load(Provider::Music, &admin).await.unwrap(),
            Some(second)
        );
        assert_eq!(
            store.load(Provider::Fitness, &admin).await.unwrap(),
            Some(fitness)
        );

        store.delete(Provider::Music, &admin).await.unwrap();
        store.delete(Provider::Music, &admin).await.unwrap();
        assert_eq!(store.load(Provider::Music, &admin).await.unwrap(), None);
        assert!(
            store
                .load(Provider::Fitness, &admin)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn memory_store_contract() {
        check_store_contract(&MemoryTokenStore::new()).await;
    }
}
