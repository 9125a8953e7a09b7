use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::api::{self, AppState};

/// Every route the backend serves.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/api/fitness/athlete", get(api::fitness::athlete))
        .route("/api/fitness/activities", get(api::fitness::activities))
        .route(
            "/api/fitness/activities/{activity_id}",
            get(api::fitness::activity),
        )
        .route("/api/music/profile", get(api::music::profile))
        .route("/api/music/top-tracks", get(api::music::top_tracks))
        .route("/api/music/recently-played", get(api::music::recently_played))
        .route("/api/music/current-playback", get(api::music::current_playback))
        .route("/api/{provider}/auth", get(api::oauth::auth))
        .route("/api/{provider}/callback", get(api::oauth::callback))
        .route("/api/{provider}/status", get(api::oauth::status))
        .route("/api/{provider}/disconnect", post(api::oauth::disconnect))
        .with_state(state)
}

/// Serves [`router`] on `addr` until the process stops.
pub async fn start_api_server(state: AppState, addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(state)).await
}
