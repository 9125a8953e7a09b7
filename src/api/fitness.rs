use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::{providers::fitness, types::Provider};

use super::{ApiError, AppState, upstream_response};

#[derive(Debug, Deserialize)]
pub struct ActivitiesQuery {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

fn first_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    30
}

/// `GET /api/fitness/athlete`
pub async fn athlete(State(state): State<AppState>) -> Result<Response, ApiError> {
    let upstream = fitness::athlete(&state.client, &state.owner).await?;
    upstream_response(Provider::Fitness, upstream)
}

/// `GET /api/fitness/activities?page=&per_page=`
pub async fn activities(
    State(state): State<AppState>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Response, ApiError> {
    let upstream =
        fitness::activities(&state.client, &state.owner, query.page, query.per_page).await?;
    upstream_response(Provider::Fitness, upstream)
}

/// `GET /api/fitness/activities/{activity_id}`
pub async fn activity(
    State(state): State<AppState>,
    Path(activity_id): Path<u64>,
) -> Result<Response, ApiError> {
    let upstream = fitness::activity(&state.client, &state.owner, activity_id).await?;
    upstream_response(Provider::Fitness, upstream)
}
