use fanout::Dispatcher;
use log::{error, info};
use service::{config::Config, logging::Logger};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use web::WsTransport;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to start simplelog: {e}");
        std::process::exit(1);
    }

    info!("Starting stream relay [{}]...", config.server_address());

    let (manager, receiver) = service::init_fanout(&config);
    let manager = Arc::new(manager);
    web::register_builtin_actions(&manager);

    let transport = Arc::new(WsTransport::new());
    let shutdown = CancellationToken::new();
    let dispatcher = Dispatcher::new(receiver, transport.clone(), shutdown.clone()).spawn();

    tokio::spawn(shutdown_signal(shutdown.clone()));

    let app_state = web::AppState::new(service::AppState::new(config, &manager), transport);
    if let Err(e) = web::init_server(app_state, shutdown.clone()).await {
        error!("Server stopped with an error: {e}");
    }

    shutdown.cancel();
    if let Err(e) = dispatcher.await {
        error!("Dispatcher task failed: {e}");
    }
    info!("Stream relay stopped");
}

/// Cancels `shutdown` on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = shutdown.cancelled() => return,
    }

    info!("Shutdown signal received");
    shutdown.cancel();
}
