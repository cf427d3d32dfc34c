use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

/// One inline button; `callback_data` comes back verbatim as a callback
/// payload when pressed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Rows of inline buttons attached below a message.
pub type Keyboard = Vec<Vec<InlineButton>>;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat API rejected the call: {0}")]
    Api(String),
}

/// Outbound side of the chat platform. Injected into the router and the
/// fanout notifier; nothing in the crate holds a global client.
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError>;

    /// Acknowledge a button press, optionally with a toast.
    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError>;
}

/// Telegram Bot API client.
pub struct TelegramChannel {
    client: reqwest::Client,
    api_base: String,
}

impl TelegramChannel {
    pub fn new(bot_token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: format!("https://api.telegram.org/bot{}", bot_token),
        }
    }

    /// Point the client at a different API host (local test servers).
    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<(), ChannelError> {
        let url = format!("{}/{}", self.api_base, method);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ChannelError::Api(format!("{}: {}", status, detail)));
        }

        let payload: serde_json::Value = response.json().await?;
        if payload.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            let description = payload
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(ChannelError::Api(description.to_string()));
        }
        Ok(())
    }

    fn reply_markup(keyboard: Option<Keyboard>) -> Option<serde_json::Value> {
        keyboard.map(|rows| json!({ "inline_keyboard": rows }))
    }
}

#[async_trait]
impl MessagingChannel for TelegramChannel {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(markup) = Self::reply_markup(keyboard) {
            body["reply_markup"] = markup;
        }
        self.call("sendMessage", body).await
    }

    async fn edit_message(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
        });
        if let Some(markup) = Self::reply_markup(keyboard) {
            body["reply_markup"] = markup;
        }
        self.call("editMessageText", body).await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> Result<(), ChannelError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call("answerCallbackQuery", body).await
    }
}
