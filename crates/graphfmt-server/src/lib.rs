//! HTTP diagnostics for a running conversion

pub mod handlers;
pub mod router;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use graphfmt_core::ConversionStats;
use tokio::net::TcpListener;

pub use router::create_router;

/// State shared with every request handler.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub stats: Arc<ConversionStats>,
}

impl ServerState {
    pub fn new(stats: Arc<ConversionStats>) -> Self {
        Self { stats }
    }
}

/// A bound diagnostics listener, ready to serve.
pub struct DiagnosticsServer {
    listener: TcpListener,
    state: Arc<ServerState>,
}

impl DiagnosticsServer {
    /// Bind `addr`. Port 0 picks any free port; see [`DiagnosticsServer::local_addr`].
    pub async fn bind(addr: SocketAddr, stats: Arc<ConversionStats>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            state: Arc::new(ServerState::new(stats)),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` resolves, then drain open connections.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("Diagnostics listening on http://{}", addr);

        axum::serve(self.listener, create_router(self.state))
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::debug!("Diagnostics server on {} stopped", addr);
        Ok(())
    }
}

#[cfg(test)]
pub mod tests;
