//! HTTP server for health checks and externally scheduled cycles.

use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

use super::routes::{router, AppState};

pub struct HttpServer {
    state: AppState,
    port: u16,
}

impl HttpServer {
    pub fn new(state: AppState, port: u16) -> Self {
        Self { state, port }
    }

    /// Serve until `shutdown` resolves. Cycles already spawned by a trigger
    /// are not awaited.
    pub async fn run<S>(self, shutdown: S) -> anyhow::Result<()>
    where
        S: Future<Output = ()> + Send + 'static,
    {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let app = router(self.state);

        info!(addr = %addr, "Starting HTTP server");
        info!("Endpoints: GET /, GET /health, GET /run-monitoring");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
