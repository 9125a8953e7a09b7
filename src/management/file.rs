use std::{io::ErrorKind, path::PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    error::TokenError,
    types::{Provider, TokenRecord, UserId},
};

use super::TokenStore;

/// All token records in one pretty-printed JSON file.
///
/// Every write replaces the whole file through a sibling temp file and a rename,
/// so readers never see a half-written file.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> Result<Vec<TokenRecord>, TokenError> {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Vec::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&self, records: &[TokenRecord]) -> Result<(), TokenError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        async_fs::write(&tmp, json).await?;
        async_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, record: &TokenRecord) -> Result<(), TokenError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.retain(|r| r.key() != record.key());
        records.push(record.clone());
        self.write_all(&records).await
    }

    async fn load(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<Option<TokenRecord>, TokenError> {
        let _guard = self.lock.lock().await;
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .find(|r| r.key() == (provider, user_id)))
    }

    async fn delete(&self, provider: Provider, user_id: &UserId) -> Result<(), TokenError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let before = records.len();
        records.retain(|r| r.key() != (provider, user_id));
        if records.len() == before {
            return Ok(());
        }
        self.write_all(&records).await
    }
}
