//! Web server for Quill.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::{QuillError, Result};

use super::handlers::AppState;
use super::router::{create_router, RouterOptions};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Router options.
    options: RouterOptions,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &Config, app_state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| QuillError::Config(format!("invalid server address: {e}")))?;

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            options: RouterOptions {
                cors_origins: config.web.cors_origins.clone(),
                debug_errors: config.web.debug_errors,
            },
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Remove comments and likes left behind by interrupted post deletions.
    async fn reconcile(&self) {
        match self.app_state.blog().purge_orphans().await {
            Ok((0, 0)) => tracing::debug!("No orphaned post data found"),
            Ok((comments, likes)) => {
                tracing::info!(comments, likes, "Reconciled orphaned post data")
            }
            Err(e) => tracing::warn!(error = %e, "Failed to reconcile orphaned post data"),
        }
    }

    async fn bind(self) -> Result<(TcpListener, axum::Router)> {
        self.reconcile().await;

        let router = create_router(self.app_state, &self.options);
        let listener = TcpListener::bind(self.addr).await?;
        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;
        tracing::info!("Web server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
