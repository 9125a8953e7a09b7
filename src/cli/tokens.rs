use tabled::Table;

use crate::{
    api::AppState,
    error,
    error::TokenError,
    info, success,
    types::{Provider, StatusTableRow, TokenLookup},
    warning,
};

use super::spinner;

pub async fn status(state: AppState, provider: Option<Provider>) {
    let providers = match provider {
        Some(p) => vec![p],
        None => Provider::ALL.to_vec(),
    };

    let mut rows = Vec::with_capacity(providers.len());
    for provider in providers {
        match state.manager.status(provider, &state.owner).await {
            Ok(status) => rows.push(StatusTableRow::from(&status)),
            Err(e) => error!("Cannot read {} status. Err: {}", provider, e),
        }
    }

    info!("Integrations of {}", state.owner);
    println!("{}", Table::new(rows));
}

pub async fn refresh(state: AppState, provider: Provider) {
    let pb = spinner(format!("Refreshing {} token...", provider.service_name()));
    let result = state.manager.force_refresh(provider, &state.owner).await;
    pb.finish_and_clear();

    match result {
        Ok(TokenLookup::Ready(_)) => success!("{} token refreshed.", provider.service_name()),
        Ok(TokenLookup::NotConnected) => warning!(
            "{} is not connected. Run: homebase connect {}",
            provider.service_name(),
            provider
        ),
        Err(e) if e.requires_reauthorization() => error!(
            "{} rejected the refresh. Run: homebase connect {}\n Error: {}",
            provider.service_name(),
            provider,
            e
        ),
        Err(e @ TokenError::Transport { .. }) => {
            error!("Cannot reach {}. Err: {}", provider.service_name(), e)
        }
        Err(e) => error!("Refresh failed. Err: {}", e),
    }
}

pub async fn disconnect(state: AppState, provider: Provider) {
    match state.manager.disconnect(provider, &state.owner).await {
        Ok(()) => success!("{} disconnected.", provider.service_name()),
        Err(e) => error!("Cannot disconnect {}. Err: {}", provider, e),
    }
}
