//! Fake OAuth provider used by the integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tokio::net::TcpListener;

use homebase::{
    providers::ProviderConfig,
    types::Provider,
};

/// How the fake treats a refresh token after it has been used once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Used refresh tokens are revoked and a new one is issued (Strava).
    SingleUse,
    /// Refresh tokens stay valid and are left out of refresh responses (Spotify).
    Reusable,
}

#[derive(Debug)]
struct FakeState {
    policy: RefreshPolicy,
    expires_in: i64,
    issued: u32,
    valid_refresh: HashSet<String>,
    valid_access: HashSet<String>,
    token_requests: Vec<HashMap<String, String>>,
}

#[derive(Clone)]
pub struct FakeProvider {
    pub base_url: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeProvider {
    /// Serves the fake on an ephemeral port until the test runtime shuts down.
    pub async fn start(policy: RefreshPolicy, expires_in: i64) -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            policy,
            expires_in,
            issued: 0,
            valid_refresh: HashSet::new(),
            valid_access: HashSet::new(),
            token_requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/oauth/token", post(token))
            .route("/api/me", get(me))
            .route("/api/athlete", get(me))
            .route("/api/athlete/activities", get(me))
            .route("/api/me/top/tracks", get(me))
            .route("/api/me/player/recently-played", get(me))
            .route("/api/activities/{id}", get(activity))
            .route("/api/me/player", get(nothing_playing))
            .route("/api/broken", get(maintenance_page))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    /// Provider config pointing at this fake.
    pub fn config(&self, provider: Provider) -> ProviderConfig {
        ProviderConfig::new(provider, "client", "secret", "http://localhost/callback").with_endpoints(
            format!("{}/oauth/authorize", self.base_url),
            format!("{}/oauth/token", self.base_url),
            format!("{}/api", self.base_url),
        )
    }

    pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
        self.state.lock().unwrap().token_requests.clone()
    }

    /// Invalidates every access token, as if the user revoked the app.
    pub fn revoke_access(&self) {
        self.state.lock().unwrap().valid_access.clear();
    }

    /// Invalidates every refresh token.
    pub fn revoke_refresh(&self) {
        self.state.lock().unwrap().valid_refresh.clear();
    }
}

fn invalid_grant() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "invalid_grant"})),
    )
        .into_response()
}

async fn token(
    State(state): State<Arc<Mutex<FakeState>>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let mut s = state.lock().unwrap();
    s.token_requests.push(form.clone());

    if form.get("client_secret").map(String::as_str) != Some("secret") {
        return (StatusCode::UNAUTHORIZED, "bad client").into_response();
    }

    let (refresh, include_refresh) = match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("good-code") => {
            s.issued += 1;
            (format!("refresh-{}", s.issued), true)
        }
        Some("refresh_token") => {
            let Some(presented) = form.get("refresh_token").cloned() else {
                return invalid_grant();
            };
            if !s.valid_refresh.contains(&presented) {
                return invalid_grant();
            }
            match s.policy {
                RefreshPolicy::SingleUse => {
                    s.valid_refresh.remove(&presented);
                    s.issued += 1;
                    (format!("refresh-{}", s.issued), true)
                }
                RefreshPolicy::Reusable => {
                    s.issued += 1;
                    (presented, false)
                }
            }
        }
        _ => return invalid_grant(),
    };

    let access = format!("access-{}", s.issued);
    s.valid_access.insert(access.clone());
    s.valid_refresh.insert(refresh.clone());

    let mut body = json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": s.expires_in,
    });
    if include_refresh {
        body["refresh_token"] = json!(refresh);
    }
    Json(body).into_response()
}

/// The bearer token of the request when it is currently valid.
fn authorized(state: &Mutex<FakeState>, headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))?
        .to_string();
    state
        .lock()
        .unwrap()
        .valid_access
        .contains(&bearer)
        .then_some(bearer)
}

async fn me(State(state): State<Arc<Mutex<FakeState>>>, headers: HeaderMap) -> Response {
    match authorized(&state, &headers) {
        Some(bearer) => {
            Json(json!({"id": "owner", "token": bearer, "items": [{"id": "t1"}]})).into_response()
        }
        None => (StatusCode::UNAUTHORIZED, "invalid token").into_response(),
    }
}

async fn activity(
    State(state): State<Arc<Mutex<FakeState>>>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    if authorized(&state, &headers).is_none() {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }
    Json(json!({"id": id, "name": "Morning Run", "distance": 5012.4})).into_response()
}

async fn maintenance_page() -> Response {
    (
        StatusCode::OK,
        [("content-type", "text/html")],
        "<html>down for maintenance</html>",
    )
        .into_response()
}

async fn nothing_playing() -> StatusCode {
    StatusCode::NO_CONTENT
}
