use std::{
    path::Path,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::{
    error::TokenError,
    types::{Provider, TokenRecord, UserId},
};

use super::TokenStore;

/// Token records in the website's SQLite database.
///
/// Timestamps are stored as RFC 3339 strings with full sub-second precision so a
/// record loads back exactly as it was saved.
pub struct SqliteTokenStore {
    conn: Mutex<Connection>,
}

impl SqliteTokenStore {
    /// Opens (or creates) the database at `path` and ensures the table exists.
    pub fn open(path: &Path) -> Result<Self, TokenError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, TokenError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, TokenError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS oauth_tokens (
                provider TEXT NOT NULL,
                user_id TEXT NOT NULL,
                access_token TEXT NOT NULL,
                refresh_token TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (provider, user_id)
            )",
            params![],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, TokenError> {
        self.conn
            .lock()
            .map_err(|_| TokenError::Persistence("sqlite connection lock poisoned".to_string()))
    }
}

fn to_text(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn from_text(column: &str, raw: &str) -> Result<DateTime<Utc>, TokenError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TokenError::Persistence(format!("invalid {} '{}': {}", column, raw, e)))
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn save(&self, record: &TokenRecord) -> Result<(), TokenError> {
        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO oauth_tokens
                (provider, user_id, access_token, refresh_token, expires_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (provider, user_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at",
            params![
                record.provider.as_str(),
                record.user_id.as_str(),
                record.access_token,
                record.refresh_token,
                to_text(&record.expires_at),
                to_text(&record.updated_at),
            ],
        )?;
        Ok(())
    }

    async fn load(
        &self,
        provider: Provider,
        user_id: &UserId,
    ) -> Result<Option<TokenRecord>, TokenError> {
        let conn = self.connection()?;
        let row = conn
            .query_row(
                "SELECT access_token, refresh_token, expires_at, updated_at
                 FROM oauth_tokens
                 WHERE provider = ?1 AND user_id = ?2",
                params![provider.as_str(), user_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((access_token, refresh_token, expires_at, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(TokenRecord {
            provider,
            user_id: user_id.clone(),
            access_token,
            refresh_token,
            expires_at: from_text("expires_at", &expires_at)?,
            updated_at: from_text("updated_at", &updated_at)?,
        }))
    }

    async fn delete(&self, provider: Provider, user_id: &UserId) -> Result<(), TokenError> {
        let conn = self.connection()?;
        conn.execute(
            "DELETE FROM oauth_tokens WHERE provider = ?1 AND user_id = ?2",
            params![provider.as_str(), user_id.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::store::tests::{check_store_contract, record};

    #[tokio::test]
    async fn sqlite_store_contract() {
        let store = SqliteTokenStore::open_in_memory().unwrap();
        check_store_contract(&store).await;
    }

    #[tokio::test]
    async fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("website.db");
        let saved = record(Provider::Fitness, "admin", "strava-access");

        SqliteTokenStore::open(&path)
            .unwrap()
            .save(&saved)
            .await
            .unwrap();

        let reopened = SqliteTokenStore::open(&path).unwrap();
        let loaded = reopened
            .load(Provider::Fitness, &saved.user_id)
            .await
            .unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn corrupt_timestamp_is_a_persistence_error() {
        let store = SqliteTokenStore::open_in_memory().unwrap();
        store
            .connection()
            .unwrap()
            .execute(
                "INSERT INTO oauth_tokens VALUES ('music', 'admin', 'a', 'r', 'yesterday', 'today')",
                params![],
            )
            .unwrap();

        let err = store
            .load(Provider::Music, &UserId::new("admin").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Persistence(_)));
    }
}
