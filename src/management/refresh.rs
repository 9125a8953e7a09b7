use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    error::TokenError,
    providers::{ProviderConfig, TokenEndpoint},
    types::{Provider, TokenGrant, TokenRecord, UserId},
    utils,
};

use super::{Clock, TokenStore};

/// Lifetime assumed when a provider reports neither `expires_in` nor `expires_at`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Turns grants from the token endpoint into stored records.
///
/// Nothing is written unless the provider answered with a usable grant, so a
/// rejected refresh leaves the previous record untouched. Failures are returned
/// as is and never retried here.
pub struct RefreshExecutor {
    store: Arc<dyn TokenStore>,
    endpoint: Arc<dyn TokenEndpoint>,
    clock: Arc<dyn Clock>,
}

impl RefreshExecutor {
    pub fn new(
        store: Arc<dyn TokenStore>,
        endpoint: Arc<dyn TokenEndpoint>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            endpoint,
            clock,
        }
    }

    /// Exchanges `record.refresh_token` for a new pair and writes it through.
    pub async fn refresh(
        &self,
        config: &ProviderConfig,
        record: &TokenRecord,
    ) -> Result<TokenRecord, TokenError> {
        let provider = record.provider;
        tracing::info!(
            %provider,
            user_id = %record.user_id,
            refresh = %utils::fingerprint(&record.refresh_token),
            "refreshing access token"
        );

        let grant = self
            .endpoint
            .refresh(config, &record.refresh_token)
            .await
            .inspect_err(|e| {
                tracing::error!(%provider, user_id = %record.user_id, "token refresh failed: {e}")
            })?;

        let refresh_token = config.refresh_policy.resolve(
            provider,
            &record.refresh_token,
            grant.refresh_token.as_deref(),
        )?;

        let now = self.clock.now();
        let updated = TokenRecord {
            provider,
            user_id: record.user_id.clone(),
            access_token: grant.access_token.clone(),
            refresh_token,
            expires_at: expires_at(provider, &grant, now)?,
            updated_at: now,
        };

        self.store.save(&updated).await?;
        tracing::info!(
            %provider,
            user_id = %updated.user_id,
            access = %utils::fingerprint(&updated.access_token),
            expires_at = %updated.expires_at,
            "access token refreshed"
        );
        Ok(updated)
    }

    /// Exchanges an authorization code and stores the first record for the pair.
    ///
    /// A grant without a refresh token cannot be kept alive and is rejected.
    pub async fn exchange(
        &self,
        config: &ProviderConfig,
        user_id: &UserId,
        code: &str,
    ) -> Result<TokenRecord, TokenError> {
        let provider = config.provider;
        let grant = self.endpoint.exchange_code(config, code).await?;

        let refresh_token = grant
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TokenError::MalformedGrant {
                provider,
                reason: "code exchange response is missing refresh_token".to_string(),
            })?;

        let now = self.clock.now();
        let record = TokenRecord {
            provider,
            user_id: user_id.clone(),
            access_token: grant.access_token.clone(),
            refresh_token,
            expires_at: expires_at(provider, &grant, now)?,
            updated_at: now,
        };

        self.store.save(&record).await?;
        tracing::info!(%provider, %user_id, expires_at = %record.expires_at, "integration connected");
        Ok(record)
    }
}

/// `now + expires_in`, falling back to the absolute `expires_at` Strava sends.
///
/// A lifetime that does not fit a timestamp is a [`TokenError::MalformedGrant`].
pub fn expires_at(
    provider: Provider,
    grant: &TokenGrant,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, TokenError> {
    let out_of_range = |field: &str, value: i64| TokenError::MalformedGrant {
        provider,
        reason: format!("{} {} is out of range", field, value),
    };

    if let Some(secs) = grant.expires_in {
        return Duration::try_seconds(secs.max(0))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| out_of_range("expires_in", secs));
    }
    match grant.expires_at {
        Some(epoch) => {
            DateTime::from_timestamp(epoch, 0).ok_or_else(|| out_of_range("expires_at", epoch))
        }
        None => Ok(now + Duration::seconds(DEFAULT_EXPIRES_IN_SECS)),
    }
}
