//! Actions every stream client can invoke, regardless of the host application.

use fanout::action::HandlerResult;
use fanout::message::{with_action, Payload};
use fanout::{Connection, Manager};
use std::sync::Arc;

/// Registers the built-in actions on `manager`.
pub fn register_builtin_actions(manager: &Manager) {
    manager.register_action("ping", Arc::new(ping));
}

/// Liveness check: answers `pong`, echoing the client's `nonce` if present.
fn ping(_connection: &Connection, payload: &Payload) -> HandlerResult {
    let mut response = with_action("pong");
    if let Some(nonce) = payload.get("nonce") {
        response.insert("nonce".to_string(), nonce.clone());
    }
    Ok(Some(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::net::SocketAddr;

    fn conn() -> Connection {
        Connection::new(SocketAddr::from(([127, 0, 0, 1], 4100)))
    }

    #[test]
    fn test_ping_echoes_nonce() {
        let payload = match json!({"action": "ping", "nonce": "n-1"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };

        let response = ping(&conn(), &payload).unwrap().unwrap();
        assert_eq!(Value::Object(response), json!({"action": "pong", "nonce": "n-1"}));
    }

    #[test]
    fn test_ping_without_nonce() {
        let response = ping(&conn(), &Payload::new()).unwrap().unwrap();
        assert_eq!(Value::Object(response), json!({"action": "pong"}));
    }
}
