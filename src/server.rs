use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use teloxide::types::Update;
use tracing::{debug, error, info};

use crate::bot::BotClient;
use crate::wake::WakeGuard;

/// Shared application state, injected into handlers via axum.
pub struct AppState {
    /// `None` only when the startup sequence has not produced a client;
    /// the webhook route then answers with a structured error.
    pub bot: Option<Arc<BotClient>>,
    pub wake: WakeGuard,
}

/// Body of every webhook response. Delivery failures are reported in-band;
/// the status code stays 200 so Telegram never re-delivers the update.
#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WebhookReply {
    Ok,
    Error { message: String },
}

impl WebhookReply {
    fn error(message: impl ToString) -> Self {
        WebhookReply::Error {
            message: message.to_string(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Telegram Bot is running!"}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

/// Receives one update pushed by Telegram.
///
/// The body is taken as raw bytes so that malformed JSON reaches the error
/// branch below instead of a framework-generated 4xx.
async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> Json<WebhookReply> {
    state.wake.observe().await;

    let Some(bot) = state.bot.as_ref() else {
        error!("Webhook call before bot client initialization");
        return Json(WebhookReply::error("bot client not initialized"));
    };

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            error!("Malformed update payload: {e}");
            return Json(WebhookReply::error(e));
        }
    };

    match bot.process_update(update).await {
        Ok(true) => info!("Update processed"),
        Ok(false) => debug!("Update carried no dispatchable command"),
        Err(e) => {
            error!("Failed to process update: {e:#}");
            return Json(WebhookReply::error(format!("{e:#}")));
        }
    }

    Json(WebhookReply::Ok)
}
