use std::str::FromStr;

use serde_json::Value;

use crate::{
    error::TokenError,
    types::{Provider, UserId},
};

use super::{ProviderClient, Upstream};

/// Time window of Spotify's personalization endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::ShortTerm => "short_term",
            TimeRange::MediumTerm => "medium_term",
            TimeRange::LongTerm => "long_term",
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short_term" => Ok(TimeRange::ShortTerm),
            "medium_term" => Ok(TimeRange::MediumTerm),
            "long_term" => Ok(TimeRange::LongTerm),
            other => Err(format!(
                "time_range must be short_term, medium_term or long_term, got '{}'",
                other
            )),
        }
    }
}

/// Spotify caps `limit` at 50 on these endpoints.
fn clamp_limit(limit: u32) -> String {
    limit.clamp(1, 50).to_string()
}

/// Paged Spotify responses wrap their payload in `items`.
fn items(upstream: Upstream) -> Upstream {
    match upstream {
        Upstream::Json(mut json) => Upstream::Json(
            json.get_mut("items")
                .map(Value::take)
                .unwrap_or_else(|| Value::Array(Vec::new())),
        ),
        other => other,
    }
}

/// `GET /me`
pub async fn profile(client: &ProviderClient, user_id: &UserId) -> Result<Upstream, TokenError> {
    client.get_json(Provider::Music, user_id, "me", &[]).await
}

/// `GET /me/top/tracks`, returning the `items` array.
pub async fn top_tracks(
    client: &ProviderClient,
    user_id: &UserId,
    time_range: TimeRange,
    limit: u32,
) -> Result<Upstream, TokenError> {
    let query = [
        ("time_range", time_range.as_str().to_string()),
        ("limit", clamp_limit(limit)),
    ];
    client
        .get_json(Provider::Music, user_id, "me/top/tracks", &query)
        .await
        .map(items)
}

/// `GET /me/player/recently-played`, returning the `items` array.
pub async fn recently_played(
    client: &ProviderClient,
    user_id: &UserId,
    limit: u32,
) -> Result<Upstream, TokenError> {
    let query = [("limit", clamp_limit(limit))];
    client
        .get_json(Provider::Music, user_id, "me/player/recently-played", &query)
        .await
        .map(items)
}

/// `GET /me/player`; Spotify answers 204 when nothing is playing.
pub async fn current_playback(
    client: &ProviderClient,
    user_id: &UserId,
) -> Result<Upstream, TokenError> {
    client
        .get_json(Provider::Music, user_id, "me/player", &[])
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn time_range_round_trips_known_values() {
        for raw in ["short_term", "medium_term", "long_term"] {
            assert_eq!(raw.parse::<TimeRange>().unwrap().as_str(), raw);
        }
        assert!("forever".parse::<TimeRange>().is_err());
    }

    #[test]
    fn items_unwraps_paged_payload() {
        let upstream = Upstream::Json(json!({"items": [{"id": "t1"}], "next": null}));
        assert_eq!(items(upstream), Upstream::Json(json!([{"id": "t1"}])));
        assert_eq!(items(Upstream::NotConnected), Upstream::NotConnected);
    }
}
