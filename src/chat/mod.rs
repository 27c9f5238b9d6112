pub mod format;
pub mod lifecycle;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat transport error: {0}")]
    Transport(String),

    #[error("chat api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed chat api response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone)]
pub struct ChatButton {
    pub label: String,
    pub callback_data: String,
}

/// Outbound chat-platform surface. All calls are best-effort from the
/// coordinator's point of view; failures never abort a state transition.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a message, optionally with an inline action keyboard. Returns
    /// the platform message id.
    async fn send_message(
        &self,
        token: &str,
        chat_id: i64,
        text: &str,
        buttons: &[ChatButton],
    ) -> Result<i64, ChatError>;

    async fn delete_message(&self, token: &str, chat_id: i64, message_id: i64)
    -> Result<(), ChatError>;

    /// Acknowledges a button press with a short alert.
    async fn answer_callback(
        &self,
        token: &str,
        callback_id: &str,
        text: &str,
    ) -> Result<(), ChatError>;
}

/// Production client for a Telegram-style bot API.
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ApiEnvelope {
    ok: bool,
    result: Option<MessageRef>,
}

#[derive(Deserialize)]
struct MessageRef {
    message_id: i64,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn call(
        &self,
        token: &str,
        method: &str,
        body: serde_json::Value,
    ) -> Result<ApiEnvelope, ChatError> {
        let url = format!("{}/bot{token}/{method}", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| ChatError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<ApiEnvelope>()
            .await
            .map_err(|err| ChatError::MalformedResponse(err.to_string()))
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(
        &self,
        token: &str,
        chat_id: i64,
        text: &str,
        buttons: &[ChatButton],
    ) -> Result<i64, ChatError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });

        if !buttons.is_empty() {
            let keyboard: Vec<serde_json::Value> = buttons
                .iter()
                .map(|b| json!([{ "text": b.label, "callback_data": b.callback_data }]))
                .collect();
            body["reply_markup"] = json!({ "inline_keyboard": keyboard });
        }

        let envelope = self.call(token, "sendMessage", body).await?;
        match envelope.result {
            Some(message) if envelope.ok => Ok(message.message_id),
            _ => Err(ChatError::MalformedResponse(
                "sendMessage returned no message id".to_string(),
            )),
        }
    }

    async fn delete_message(
        &self,
        token: &str,
        chat_id: i64,
        message_id: i64,
    ) -> Result<(), ChatError> {
        self.call(
            token,
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        token: &str,
        callback_id: &str,
        text: &str,
    ) -> Result<(), ChatError> {
        self.call(
            token,
            "answerCallbackQuery",
            json!({ "callback_query_id": callback_id, "text": text, "show_alert": true }),
        )
        .await?;
        Ok(())
    }
}
