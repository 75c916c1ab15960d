use crate::AppState;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;
use fanout::Connection;
use futures::StreamExt;
use log::*;
use std::net::SocketAddr;

/// Upgrades the request and keeps the socket open for streamed messages.
pub(crate) async fn stream_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    debug!("Upgrading stream connection from {remote}");
    ws.on_upgrade(move |socket| handle_socket(socket, remote, app_state))
}

/// Drives one connection from connect to disconnect.
///
/// The write half goes to the shared transport for the dispatcher; this task
/// only reads. Text frames are handed to the manager in arrival order.
async fn handle_socket(socket: WebSocket, remote: SocketAddr, app_state: AppState) {
    let connection = Connection::new(remote);
    let manager = app_state.manager();
    let (sink, mut stream) = socket.split();

    app_state.transport.register(connection.id(), sink);
    manager.on_connect(&connection);

    let (code, reason) = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                manager.on_message(&connection, text.as_str()).await;
            }
            Some(Ok(Message::Close(frame))) => break close_details(frame),
            Some(Ok(_)) => {
                trace!("Ignoring non-text frame from {connection}");
            }
            Some(Err(e)) => {
                warn!("Read error on {connection}: {e}");
                break (close_code::ERROR, e.to_string());
            }
            None => break (close_code::ABNORMAL, String::new()),
        }
    };

    app_state.transport.unregister(&connection.id());
    manager.on_disconnect(&connection, code, &reason);
}

fn close_details(frame: Option<CloseFrame>) -> (u16, String) {
    match frame {
        Some(frame) => (frame.code, frame.reason.to_string()),
        None => (close_code::STATUS, String::new()),
    }
}
