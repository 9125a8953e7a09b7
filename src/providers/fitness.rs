//! Strava reads used by the fitness page.

use crate::{
    error::TokenError,
    types::{Provider, UserId},
};

use super::{ProviderClient, Upstream};

/// Largest page Strava serves for activity listings.
pub const MAX_PER_PAGE: u32 = 200;

/// Retrieves the authenticated athlete's profile (`GET /athlete`).
pub async fn athlete(client: &ProviderClient, user_id: &UserId) -> Result<Upstream, TokenError> {
    client
        .get_json(Provider::Fitness, user_id, "athlete", &[])
        .await
}

/// Retrieves a page of the athlete's activities (`GET /athlete/activities`).
///
/// # Arguments
///
/// * `page` - 1-based page number; `0` is treated as `1`
/// * `per_page` - page size, clamped to `1..=200`
pub async fn activities(
    client: &ProviderClient,
    user_id: &UserId,
    page: u32,
    per_page: u32,
) -> Result<Upstream, TokenError> {
    let query = [
        ("page", page.max(1).to_string()),
        ("per_page", per_page.clamp(1, MAX_PER_PAGE).to_string()),
    ];
    client
        .get_json(Provider::Fitness, user_id, "athlete/activities", &query)
        .await
}

/// Retrieves one activity by id (`GET /activities/{id}`).
pub async fn activity(
    client: &ProviderClient,
    user_id: &UserId,
    activity_id: u64,
) -> Result<Upstream, TokenError> {
    let path = format!("activities/{}", activity_id);
    client
        .get_json(Provider::Fitness, user_id, &path, &[])
        .await
}
