#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use chrono::Duration;
use courier_coordinator::api::rest::router;
use courier_coordinator::chat::{ChatApi, ChatButton, ChatError};
use courier_coordinator::state::AppState;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
    pub buttons: Vec<(String, String)>,
}

/// Chat double that records every outbound call and hands out sequential
/// message ids.
pub struct RecordingChatApi {
    next_id: AtomicI64,
    pub sent: Mutex<Vec<SentMessage>>,
    pub deleted: Mutex<Vec<(i64, i64)>>,
    pub callbacks: Mutex<Vec<(String, String)>>,
}

impl RecordingChatApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentMessage> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect()
    }

    pub fn deleted_from(&self, chat_id: i64) -> Vec<i64> {
        self.deleted
            .lock()
            .unwrap()
            .iter()
            .filter(|(chat, _)| *chat == chat_id)
            .map(|(_, message_id)| *message_id)
            .collect()
    }
}

#[async_trait]
impl ChatApi for RecordingChatApi {
    async fn send_message(
        &self,
        _token: &str,
        chat_id: i64,
        text: &str,
        buttons: &[ChatButton],
    ) -> Result<i64, ChatError> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            message_id,
            text: text.to_string(),
            buttons: buttons
                .iter()
                .map(|b| (b.label.clone(), b.callback_data.clone()))
                .collect(),
        });
        Ok(message_id)
    }

    async fn delete_message(
        &self,
        _token: &str,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), ChatError> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn answer_callback(
        &self,
        _token: &str,
        callback_id: &str,
        text: &str,
    ) -> Result<(), ChatError> {
        self.callbacks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.to_string()));
        Ok(())
    }
}

pub fn setup() -> (
    axum::Router,
    Arc<AppState>,
    Arc<RecordingChatApi>,
    mpsc::Receiver<Uuid>,
) {
    let chat = Arc::new(RecordingChatApi::new());
    let (state, broadcast_rx) = AppState::new(chat.clone(), 1024, Duration::hours(1));
    let shared = Arc::new(state);
    (router(shared.clone()), shared, chat, broadcast_rx)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Callback-query update as the chat platform posts it.
pub fn button_press(chat_id: i64, data: String) -> Value {
    serde_json::json!({
        "callback_query": {
            "id": format!("cb-{chat_id}-{data}"),
            "from": { "id": chat_id },
            "data": data
        }
    })
}

pub fn shared_location(chat_id: i64, lat: f64, lng: f64) -> Value {
    serde_json::json!({
        "message": {
            "from": { "id": chat_id },
            "location": { "latitude": lat, "longitude": lng }
        }
    })
}
