//! HTTP and WebSocket boundary for the stream relay.
//!
//! Exposes the notification stream as a WebSocket route, a health check and a
//! JSON 404 for everything else. Connection handling is delegated to the
//! `fanout` core; this crate only moves frames between sockets and the core.

use fanout::Manager;
use log::*;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub mod actions;
mod controller;
pub mod router;
pub mod ws;

pub use actions::register_builtin_actions;
pub use ws::transport::WsTransport;

/// Router state: the service-level state plus the socket transport.
#[derive(Clone)]
pub struct AppState {
    pub service: service::AppState,
    pub transport: Arc<WsTransport>,
}

impl AppState {
    pub fn new(service: service::AppState, transport: Arc<WsTransport>) -> Self {
        Self { service, transport }
    }

    pub fn manager(&self) -> Arc<Manager> {
        Arc::clone(&self.service.fanout_manager)
    }
}

/// Binds the configured address and serves until `shutdown` is cancelled.
pub async fn init_server(app_state: AppState, shutdown: CancellationToken) -> std::io::Result<()> {
    let address = app_state.service.config.server_address();
    let listener = TcpListener::bind(&address).await?;

    info!(
        "Exposing API on {}, stream at {}",
        listener.local_addr()?,
        app_state.service.config.stream_path()
    );

    serve(listener, app_state, shutdown).await
}

/// Serves on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    app_state: AppState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router::define_routes(app_state);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
}

#[cfg(test)]
pub(crate) fn test_state() -> AppState {
    let config = service::config::Config::from_args(["stream_relay"]).unwrap();
    let (manager, _receiver) = service::init_fanout(&config);
    let manager = Arc::new(manager);
    AppState::new(
        service::AppState::new(config, &manager),
        Arc::new(WsTransport::new()),
    )
}
