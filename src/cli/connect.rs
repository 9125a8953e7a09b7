use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use crate::{
    api::AppState, config, error, server::start_api_server, success, types::Provider, utils,
    warning,
};

use super::spinner;

const MAX_WAIT: Duration = Duration::from_secs(120);

/// Runs the browser connect flow for `provider` against the local callback server.
pub async fn connect(state: AppState, provider: Provider) {
    let previous = match state.manager.status(provider, &state.owner).await {
        Ok(status) => status.expires_at,
        Err(e) => error!("Cannot read token store. Err: {}", e),
    };

    let nonce = utils::generate_state();
    let auth_url = match state.manager.authorize_url(provider, &nonce) {
        Ok(url) => url,
        Err(e) => error!("Cannot build authorization URL. Err: {}", e),
    };
    state.pending.insert(nonce, provider).await;

    let server_state = state.clone();
    let addr = config::server_addr();
    tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, &addr).await {
            warning!("Callback server stopped. Err: {}", e);
        }
    });

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let pb = spinner(format!(
        "Waiting for {} authorization...",
        provider.service_name()
    ));
    let connected = wait_for_connection(&state, provider, previous).await;
    pb.finish_and_clear();

    match connected {
        Some(expires_at) => success!(
            "{} connected. Token valid until {}",
            provider.service_name(),
            expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => error!("Authorization failed or timed out."),
    }
}

/// Polls the store until a record newer than `previous` appears.
async fn wait_for_connection(
    state: &AppState,
    provider: Provider,
    previous: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    let start = Instant::now();

    while start.elapsed() < MAX_WAIT {
        if let Ok(status) = state.manager.status(provider, &state.owner).await {
            if status.connected && status.expires_at != previous {
                return status.expires_at;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}
