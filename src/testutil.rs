//! Mock Telegram Bot API server for tests.
//!
//! Binds an ephemeral port, records every API call (method name, parsed
//! payload), and answers with a canned success body so teloxide requests
//! complete normally.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Json, Router};
use serde_json::{json, Value};
use teloxide::types::Update;
use url::Url;

/// (lowercased method name, request payload) per API call received.
pub type RequestLog = Arc<Mutex<Vec<(String, Value)>>>;

async fn mock_api(State(log): State<RequestLog>, req: Request) -> Json<Value> {
    let method = req
        .uri()
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    // teloxide sends most methods as JSON, but setWebhook goes out as
    // multipart/form-data (it can carry a certificate file), so the mock
    // flattens multipart fields into an object to keep payloads assertable.
    let payload = if content_type.starts_with("multipart/form-data") {
        let mut fields = serde_json::Map::new();
        let mut multipart = Multipart::from_request(req, &()).await.unwrap();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let text = field.text().await.unwrap_or_default();
            fields.insert(name, Value::String(text));
        }
        Value::Object(fields)
    } else {
        let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    log.lock().unwrap().push((method.clone(), payload));

    let result = if method == "setwebhook" {
        json!(true)
    } else {
        // A minimal Message object, enough for SendMessage to deserialize.
        json!({
            "message_id": 1,
            "date": 0,
            "chat": {"id": 42, "type": "private"},
            "text": "reply"
        })
    };
    Json(json!({"ok": true, "result": result}))
}

/// Starts the mock API server and returns its request log plus the base URL
/// to pass to `Bot::set_api_url`.
pub async fn spawn_mock_api() -> (RequestLog, Url) {
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(mock_api).with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (log, Url::parse(&format!("http://{addr}/")).unwrap())
}

/// A well-formed Telegram update carrying one text message.
pub fn update_json(update_id: u32, chat_id: i64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": 1,
            "date": 0,
            "chat": {"id": chat_id, "type": "private"},
            "from": {"id": 7, "is_bot": false, "first_name": "Test"},
            "text": text
        }
    })
}

/// Deserializes an update payload the way the webhook route does. Going
/// through a string matters: `Update`'s flattened kind does not survive
/// `serde_json::from_value` and degrades to its error variant.
pub fn parse_update(value: &Value) -> Update {
    serde_json::from_str(&value.to_string()).unwrap()
}
