//! Integration tests for the HTTP surface.

use notify::{webhook_channel, CommandChannel, Command};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;
use watcher::server::{router, serve_on, WebhookState, LIVENESS_REPLY, SECRET_HEADER, WEBHOOK_PATH};

/// Serve `app` on an ephemeral local port and return its base URL.
async fn spawn_server(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve_on(listener, app));
    format!("http://{addr}")
}

fn stop_update() -> serde_json::Value {
    json!({
        "update_id": 7,
        "message": { "message_id": 1, "chat": { "id": 42 }, "text": "/stop" }
    })
}

#[tokio::test]
async fn test_liveness() {
    let base = spawn_server(router(None)).await;

    let response = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), LIVENESS_REPLY);
}

#[tokio::test]
async fn test_webhook_absent_without_transport() {
    let base = spawn_server(router(None)).await;

    let response = reqwest::Client::new()
        .post(format!("{base}{WEBHOOK_PATH}"))
        .json(&stop_update())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_checks_secret_and_forwards() {
    let (sender, mut channel) = webhook_channel(8);
    let state = WebhookState::new(sender, Some("s3cret".to_string()));
    let base = spawn_server(router(Some(state))).await;
    let client = reqwest::Client::new();

    let rejected = client
        .post(format!("{base}{WEBHOOK_PATH}"))
        .header(SECRET_HEADER, "wrong")
        .json(&stop_update())
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);

    let accepted = client
        .post(format!("{base}{WEBHOOK_PATH}"))
        .header(SECRET_HEADER, "s3cret")
        .json(&stop_update())
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), StatusCode::OK);

    let incoming = channel.next_command().await.unwrap();
    assert_eq!(incoming.chat_id, 42);
    assert_eq!(incoming.command, Command::Stop);
}
