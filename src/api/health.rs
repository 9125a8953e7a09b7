use axum::{extract::State, response::Json};
use serde_json::{Map, Value, json};

use crate::types::Provider;

use super::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let providers: Map<String, Value> = Provider::ALL
        .iter()
        .map(|p| {
            (
                p.to_string(),
                json!({ "configured": state.manager.providers().is_configured(*p) }),
            )
        })
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "providers": providers,
    }))
}
