//! Web server for Folio.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::logging::LogControl;
use crate::{FolioError, Result};

use super::handlers::AppState;
use super::router::create_router;

/// HTTP server wrapping the dispatch router.
pub struct WebServer {
    addr: SocketAddr,
    state: Arc<AppState>,
}

impl WebServer {
    pub fn new(config: Config, log_control: LogControl) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FolioError::Config(format!("invalid server address: {e}")))?;
        let state = Arc::new(AppState::new(config, log_control)?);
        Ok(Self { addr, state })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the server until the process exits.
    pub async fn run(self) -> std::io::Result<()> {
        let router = create_router(self.state);
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("listening on http://{}", local_addr);
        axum::serve(listener, router).await
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Useful for tests binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = create_router(self.state);
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
