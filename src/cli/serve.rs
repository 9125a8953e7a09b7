use crate::{api::AppState, config, error, info, server::start_api_server};

pub async fn serve(state: AppState) {
    let addr = config::server_addr();
    info!("Serving on http://{} for {}", addr, state.owner);

    if let Err(e) = start_api_server(state, &addr).await {
        error!("Server failed. Err: {}", e);
    }
}
