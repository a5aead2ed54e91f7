use std::sync::Arc;

use dsv_store::FsStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::AppState;
use crate::router::build_router;

/// Datasets HTTP server.
pub struct DsvServer {
    state: AppState,
}

impl DsvServer {
    /// Open the configured store and prepare the server.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = FsStore::open(&config.store)?;
        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Serve an already opened store.
    pub fn with_store(store: Arc<FsStore>, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(store, config),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.state.config
    }

    pub fn store(&self) -> &Arc<FsStore> {
        &self.state.store
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let config = Arc::clone(&self.state.config);
        let app = self.router();
        let listener = TcpListener::bind(config.bind_addr).await?;

        tracing::info!(
            addr = %listener.local_addr()?,
            service = %config.service_name,
            prefix = %config.normalized_prefix(),
            root = %self.state.store.root().display(),
            metadata = ?config.metadata,
            "datasets server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("datasets server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
