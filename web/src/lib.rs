use log::*;
use std::io;
use tokio::net::TcpListener;

pub use error::{Error, Result};
pub use service::AppState;

mod controller;
mod error;
mod middleware;
pub mod router;
mod sse;
#[cfg(test)]
mod test_support;

/// Binds the configured interface and port, then serves the API until Ctrl-C.
pub async fn init_server(app_state: AppState) -> io::Result<()> {
    let interface = app_state
        .config
        .interface
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let listen_addr = format!("{}:{}", interface, app_state.config.port);

    let listener = TcpListener::bind(&listen_addr).await?;
    info!("Server starting... listening for connections on http://{listen_addr}");

    let sse_manager = app_state.sse_manager.clone();
    let router = router::define_routes(app_state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for the shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received, closing settings streams");
            // Open streams never finish on their own
            sse_manager.close_all();
        })
        .await
}
