use super::types::{
    ApiResponse, DeleteMessageRequest, EditMessageTextRequest, GetUpdatesRequest, Message,
    MessageId, ParseMode, SendMessageRequest, Update,
};
use super::Messenger;
use crate::models::{ChatId, DEFAULT_TELEGRAM_API_BASE};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Extra time allowed on top of a long-poll timeout before the request is abandoned.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Minimal Telegram Bot API client.
pub struct TelegramClient {
    client: Client,
    token: String,
    base_url: String,
    timeout: Duration,
}

impl TelegramClient {
    pub fn new(token: String) -> Self {
        Self::new_with_client(token, Client::new())
    }

    pub fn new_with_client(token: String, client: Client) -> Self {
        Self {
            client,
            token,
            base_url: DEFAULT_TELEGRAM_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
        timeout: Duration,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(request)
            .send()
            .await
            // The URL embeds the bot token.
            .map_err(|e| {
                let e = e.without_url();
                tracing::warn!("Failed to send {} to Telegram: {}", method, e);
                e
            })?;

        Self::parse_response(method, response).await
    }

    async fn parse_response<Resp: DeserializeOwned>(
        method: &str,
        response: Response,
    ) -> Result<Resp> {
        let status = response.status();
        let body = response.text().await.map_err(|e| e.without_url())?;

        let envelope: ApiResponse<Resp> = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(
                "Failed to parse Telegram {} response (status {}): {}\nBody: {}",
                method,
                status,
                e,
                body
            );
            Error::Messenger(format!("Failed to parse Telegram {} response: {}", method, e))
        })?;

        if !status.is_success() || !envelope.ok {
            let description = envelope.description.unwrap_or(body);
            tracing::warn!(
                "Telegram {} error (status {}): {}",
                method,
                status,
                description
            );
            return Err(Error::Messenger(format!(
                "Telegram {} error (status {}): {}",
                method, status, description
            )));
        }

        envelope
            .result
            .ok_or_else(|| Error::Messenger(format!("Telegram {} returned no result", method)))
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
        };
        let message: Message = self.call("sendMessage", &request, self.timeout).await?;
        Ok(message.message_id)
    }

    async fn send_photo(&self, chat_id: &ChatId, photo: Vec<u8>) -> Result<MessageId> {
        tracing::debug!("Uploading {} byte photo to chat {}", photo.len(), chat_id);

        let part = Part::bytes(photo)
            .file_name("meme.png")
            .mime_str("image/png")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("photo", part);

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                tracing::warn!("Failed to send sendPhoto to Telegram: {}", e);
                e
            })?;

        let message: Message = Self::parse_response("sendPhoto", response).await?;
        Ok(message.message_id)
    }

    async fn edit_message_text(
        &self,
        chat_id: &ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<()> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text,
        };
        // Result is either the edited message or `true`.
        let _: serde_json::Value = self
            .call("editMessageText", &request, self.timeout)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: &ChatId, message_id: MessageId) -> Result<()> {
        let request = DeleteMessageRequest {
            chat_id,
            message_id,
        };
        let _: bool = self.call("deleteMessage", &request, self.timeout).await?;
        Ok(())
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string()],
        };
        let timeout = Duration::from_secs(u64::from(timeout_secs)) + POLL_GRACE;
        self.call("getUpdates", &request, timeout).await
    }
}
