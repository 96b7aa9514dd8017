//! HTTP surface: liveness probe and the optional Telegram webhook receiver.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use notify::{Update, UpdateSender};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub const LIVENESS_REPLY: &str = "🤖 Wallet watcher is alive!";

/// Route Telegram delivers webhook updates to.
pub const WEBHOOK_PATH: &str = "/telegram/webhook";

pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// State behind the webhook route.
#[derive(Debug, Clone)]
pub struct WebhookState {
    sender: UpdateSender,
    secret: Option<String>,
}

impl WebhookState {
    pub const fn new(sender: UpdateSender, secret: Option<String>) -> Self {
        Self { sender, secret }
    }
}

/// Build the router. The webhook route exists only when `webhook` is given.
pub fn router(webhook: Option<WebhookState>) -> Router {
    let router = Router::new().route("/", get(liveness));

    match webhook {
        Some(state) => router.merge(
            Router::new()
                .route(WEBHOOK_PATH, post(receive_update))
                .with_state(state),
        ),
        None => router,
    }
}

/// Bind `0.0.0.0:port` and serve until the task is dropped.
pub async fn serve(port: u16, router: Router) -> eyre::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    serve_on(listener, router).await
}

/// Serve on an already bound listener.
pub async fn serve_on(listener: TcpListener, router: Router) -> eyre::Result<()> {
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn liveness() -> &'static str {
    LIVENESS_REPLY
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(update): Json<Update>,
) -> StatusCode {
    if let Some(secret) = &state.secret {
        let provided = headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok());
        if provided != Some(secret.as_str()) {
            warn!(update_id = update.update_id, "Rejecting webhook update with a bad secret");
            return StatusCode::UNAUTHORIZED;
        }
    }

    debug!(update_id = update.update_id, "Webhook update received");
    if state.sender.forward(update).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
