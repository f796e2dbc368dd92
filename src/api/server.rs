//! API server lifecycle.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. The binary keeps the handle and triggers a graceful
//! shutdown on ctrl-c; tests bind to an ephemeral localhost port.

use std::net::SocketAddr;

use axum::ServiceExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_service;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Signal the server to shut down gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) {
        let _ = self.handle.await;
    }
}

/// Bind the listener and spawn the server in a background task.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> anyhow::Result<ApiServer> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = api_service(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(
            listener,
            ServiceExt::<axum::extract::Request>::into_make_service(app),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        handle,
    })
}
