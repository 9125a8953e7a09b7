use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Third-party OAuth services the website integrates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Fitness tracking (Strava).
    Fitness,
    /// Music streaming (Spotify).
    Music,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Fitness, Provider::Music];

    /// Stable identifier used for persistence and routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Fitness => "fitness",
            Provider::Music => "music",
        }
    }

    /// Name of the upstream service.
    pub fn service_name(&self) -> &'static str {
        match self {
            Provider::Fitness => "Strava",
            Provider::Music => "Spotify",
        }
    }

    /// Prefix of the environment variables holding this provider's settings.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Provider::Fitness => "STRAVA",
            Provider::Music => "SPOTIFY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fitness" | "strava" => Ok(Provider::Fitness),
            "music" | "spotify" => Ok(Provider::Music),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Identifier of the account owning a set of tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("user id must not be empty".to_string());
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserId::new(s)
    }
}

impl TryFrom<String> for UserId {
    type Error = String;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        UserId::new(id)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// The single live credential pair for a (provider, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub provider: Provider,
    pub user_id: UserId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TokenRecord {
    pub fn key(&self) -> (Provider, &UserId) {
        (self.provider, &self.user_id)
    }
}

/// Body of a successful response from a provider's token endpoint.
///
/// Strava reports both `expires_in` and an absolute `expires_at`; Spotify only
/// `expires_in` and may leave out `refresh_token` on refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Outcome of asking for a usable access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    Ready(String),
    NotConnected,
}

/// Freshness of a stored token relative to the grace window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenState {
    Valid,
    Expiring,
    Expired,
    Unconnected,
}

impl fmt::Display for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenState::Valid => "valid",
            TokenState::Expiring => "expiring",
            TokenState::Expired => "expired",
            TokenState::Unconnected => "unconnected",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub provider: Provider,
    pub connected: bool,
    pub state: TokenState,
    pub expires_at: Option<DateTime<Utc>>,
    pub expires_in_seconds: Option<i64>,
}

#[derive(Tabled)]
pub struct StatusTableRow {
    pub provider: String,
    pub service: String,
    pub state: String,
    pub expires_at: String,
}

impl From<&ConnectionStatus> for StatusTableRow {
    fn from(status: &ConnectionStatus) -> Self {
        Self {
            provider: status.provider.to_string(),
            service: status.provider.service_name().to_string(),
            state: status.state.to_string(),
            expires_at: status
                .expires_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_accepts_service_names() {
        assert_eq!("strava".parse::<Provider>().unwrap(), Provider::Fitness);
        assert_eq!("Spotify".parse::<Provider>().unwrap(), Provider::Music);
        assert_eq!("music".parse::<Provider>().unwrap(), Provider::Music);
        assert!("garmin".parse::<Provider>().is_err());
    }

    #[test]
    fn user_id_rejects_blank() {
        assert!(UserId::new("  ").is_err());
        assert_eq!(UserId::new("admin").unwrap().as_str(), "admin");
    }

    #[test]
    fn user_id_deserialization_validates() {
        assert!(serde_json::from_str::<UserId>(r#""""#).is_err());
        assert!(serde_json::from_str::<UserId>(r#""   ""#).is_err());

        let id: UserId = serde_json::from_str(r#""admin""#).unwrap();
        assert_eq!(id.as_str(), "admin");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""admin""#);
    }

    #[test]
    fn grant_parses_without_refresh_token() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"access_token":"abc","token_type":"Bearer","expires_in":3600,"scope":"user-top-read"}"#,
        )
        .unwrap();
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.refresh_token, None);
        assert_eq!(grant.expires_in, Some(3600));
    }
}
