//! Telegram bot transport
//!
//! Answers greeting commands from a long-polling loop and delivers generated
//! memes to chats when the `/img` trigger endpoint is called.

pub mod commands;
pub mod handler;
pub mod mock;
pub mod telegram;
pub mod types;

pub use commands::{BotCommand, CommandListener};
pub use handler::BotHandler;
pub use mock::{MockMessenger, SentItem};
pub use telegram::TelegramClient;
pub use types::{MessageId, ParseMode, Update};

use crate::models::ChatId;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId>;
    async fn send_photo(&self, chat_id: &ChatId, photo: Vec<u8>) -> Result<MessageId>;
    async fn edit_message_text(
        &self,
        chat_id: &ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<()>;
    async fn delete_message(&self, chat_id: &ChatId, message_id: MessageId) -> Result<()>;
    /// Long-polls for new updates starting at `offset`.
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Vec<Update>>;
}
