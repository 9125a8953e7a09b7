use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::{
    providers::music::{self, TimeRange},
    types::Provider,
};

use super::{ApiError, AppState, upstream_response};

const DEFAULT_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
pub struct TopTracksQuery {
    time_range: Option<String>,
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<u32>,
}

/// `GET /api/music/profile`
pub async fn profile(State(state): State<AppState>) -> Result<Response, ApiError> {
    let upstream = music::profile(&state.client, &state.owner).await?;
    upstream_response(Provider::Music, upstream)
}

/// `GET /api/music/top-tracks?time_range=&limit=`
pub async fn top_tracks(
    State(state): State<AppState>,
    Query(query): Query<TopTracksQuery>,
) -> Result<Response, ApiError> {
    let time_range = match query.time_range.as_deref() {
        Some(raw) => raw.parse::<TimeRange>().map_err(ApiError::BadRequest)?,
        None => TimeRange::default(),
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

    let upstream = music::top_tracks(&state.client, &state.owner, time_range, limit).await?;
    upstream_response(Provider::Music, upstream)
}

/// `GET /api/music/recently-played?limit=`
pub async fn recently_played(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    let upstream = music::recently_played(&state.client, &state.owner, limit).await?;
    upstream_response(Provider::Music, upstream)
}

/// `GET /api/music/current-playback`, 204 when nothing is playing.
pub async fn current_playback(State(state): State<AppState>) -> Result<Response, ApiError> {
    let upstream = music::current_playback(&state.client, &state.owner).await?;
    upstream_response(Provider::Music, upstream)
}
