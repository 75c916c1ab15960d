use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use log::*;
use serde_json::json;
use std::net::SocketAddr;

/// Answers every unrouted request with a JSON 404.
pub async fn not_found(request: Request) -> impl IntoResponse {
    let caller = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        "User at {} attempted to hit nonexistent endpoint {} {}",
        caller,
        request.method(),
        request.uri()
    );

    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "error",
            "info": "Resource not found."
        })),
    )
}
