//! # API Module
//!
//! HTTP endpoints the personal website's frontend talks to. They cover the OAuth
//! connect flow for both integrations and the read-only provider data shown on
//! the site.
//!
//! ## Endpoints
//!
//! ### Monitoring
//!
//! - [`health`] - service status, version and which providers are configured
//!
//! ### Connect flow
//!
//! `{provider}` accepts `fitness`, `music`, `strava` or `spotify`.
//!
//! - [`oauth::auth`] - `GET /api/{provider}/auth`, returns `{"auth_url": ...}`
//! - [`oauth::callback`] - `GET /api/{provider}/callback`, exchanges the code
//! - [`oauth::status`] - `GET /api/{provider}/status`
//! - [`oauth::disconnect`] - `POST /api/{provider}/disconnect`
//!
//! ### Provider data
//!
//! - `GET /api/fitness/athlete`, `GET /api/fitness/activities`
//! - `GET /api/music/profile`, `GET /api/music/top-tracks`,
//!   `GET /api/music/recently-played`, `GET /api/music/current-playback`
//!
//! ## Errors
//!
//! Every failure is an [`ApiError`] rendered as
//! `{"error": {"code": ..., "message": ...}}`:
//!
//! | Condition                         | Status | Code                       |
//! |-----------------------------------|--------|----------------------------|
//! | no stored token                   | 401    | `not_connected`            |
//! | provider rejected refresh or call | 401    | `integration_disconnected` |
//! | provider unreachable              | 502    | `upstream_unreachable`     |
//! | storage or configuration failure  | 500    | `persistence_error`, ...   |
//!
//! All handlers act for the configured owner ([`AppState::owner`]).

mod error;
pub mod fitness;
mod health;
pub mod music;
pub mod oauth;
mod state;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub use error::ApiError;
pub use health::health;
pub use state::{AppState, PENDING_TTL, PendingAuthorizations};

use crate::{providers::Upstream, types::Provider};

pub(crate) fn parse_provider(raw: &str) -> Result<Provider, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::UnknownProvider(raw.to_string()))
}

pub(crate) fn upstream_response(
    provider: Provider,
    upstream: Upstream,
) -> Result<Response, ApiError> {
    match upstream {
        Upstream::Json(value) => Ok(Json(value).into_response()),
        Upstream::NoContent => Ok(StatusCode::NO_CONTENT.into_response()),
        Upstream::NotConnected => Err(ApiError::NotConnected(provider)),
    }
}
