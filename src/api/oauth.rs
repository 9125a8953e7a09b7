use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    providers::{Upstream, fitness, music},
    types::{ConnectionStatus, Provider},
    utils,
};

use super::{ApiError, AppState, parse_provider};

/// `GET /api/{provider}/auth`
pub async fn auth(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let provider = parse_provider(&provider)?;
    let nonce = utils::generate_state();
    let auth_url = state.manager.authorize_url(provider, &nonce)?;
    state.pending.insert(nonce, provider).await;

    Ok(Json(json!({ "auth_url": auth_url })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /api/{provider}/callback?code=&state=`
///
/// Exchanges the code for the owner and answers with the freshly connected
/// profile. The `state` must be one issued by [`auth`] for this provider.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Value>, ApiError> {
    let provider = parse_provider(&provider)?;

    if let Some(error) = params.error {
        tracing::warn!(%provider, %error, "authorization denied");
        return Err(ApiError::BadRequest(format!("authorization denied: {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("missing code".to_string()))?;

    let nonce = params.state.unwrap_or_default();
    if !state.pending.take(&nonce, provider).await {
        tracing::warn!(%provider, "callback with missing or unknown state");
        return Err(ApiError::InvalidState);
    }

    let record = state.manager.connect(provider, &state.owner, &code).await?;
    let profile = connected_profile(&state, provider).await;

    let mut body = json!({
        "message": format!("{} connected successfully!", provider.service_name()),
        "provider": provider,
        "expires_at": record.expires_at,
    });
    body[profile_key(provider)] = profile;

    Ok(Json(body))
}

fn profile_key(provider: Provider) -> &'static str {
    match provider {
        Provider::Fitness => "athlete",
        Provider::Music => "profile",
    }
}

/// Reads the profile with the token just stored. The connection already
/// succeeded, so a failed read answers `null`.
async fn connected_profile(state: &AppState, provider: Provider) -> Value {
    let upstream = match provider {
        Provider::Fitness => fitness::athlete(&state.client, &state.owner).await,
        Provider::Music => music::profile(&state.client, &state.owner).await,
    };

    match upstream {
        Ok(Upstream::Json(profile)) => profile,
        Ok(_) => Value::Null,
        Err(error) => {
            tracing::warn!(%provider, %error, "could not read profile after connecting");
            Value::Null
        }
    }
}

/// `GET /api/{provider}/status`
pub async fn status(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<ConnectionStatus>, ApiError> {
    let provider = parse_provider(&provider)?;
    Ok(Json(state.manager.status(provider, &state.owner).await?))
}

/// `POST /api/{provider}/disconnect`
pub async fn disconnect(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let provider = parse_provider(&provider)?;
    state.manager.disconnect(provider, &state.owner).await?;

    Ok(Json(json!({
        "message": format!("{} disconnected", provider.service_name()),
        "provider": provider,
    })))
}
