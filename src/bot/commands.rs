use super::types::{ParseMode, Update};
use super::Messenger;
use crate::models::ChatId;
use crate::prompts;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

const LONG_POLL_SECS: u32 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Chat commands the bot answers directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
}

impl BotCommand {
    /// Parses the leading command of a message, accepting `/cmd@BotName`.
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.split_whitespace().next()?;
        let command = first.strip_prefix('/')?;
        let name = command.split('@').next().unwrap_or(command);

        match name.to_ascii_lowercase().as_str() {
            "start" => Some(BotCommand::Start),
            "help" => Some(BotCommand::Help),
            _ => None,
        }
    }
}

/// Long-polls the Bot API and replies to greeting commands.
pub struct CommandListener {
    messenger: Arc<dyn Messenger>,
}

impl CommandListener {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }

    /// Polls forever. Errors are logged and retried after a short pause.
    pub async fn run(self) {
        info!("Listening for bot commands");
        let mut offset = None;
        loop {
            match self.poll_once(offset, LONG_POLL_SECS).await {
                Ok(next) => offset = next.or(offset),
                Err(e) => {
                    error!("Polling Telegram updates failed: {}", e);
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// Fetches one batch and handles it, returning the next offset to request.
    pub async fn poll_once(&self, offset: Option<i64>, timeout_secs: u32) -> Result<Option<i64>> {
        let updates = self.messenger.get_updates(offset, timeout_secs).await?;
        debug!("Received {} updates", updates.len());

        let mut next = None;
        for update in updates {
            next = Some(update.update_id + 1);
            if let Err(e) = self.handle_update(&update).await {
                error!("Failed to handle update {}: {}", update.update_id, e);
            }
        }
        Ok(next)
    }

    pub async fn handle_update(&self, update: &Update) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(command) = message.text.as_deref().and_then(BotCommand::parse) else {
            return Ok(());
        };

        let chat_id = ChatId::Id(message.chat.id);
        info!("Answering {:?} in chat {}", command, chat_id);
        self.messenger
            .send_message(&chat_id, prompts::WELCOME, Some(ParseMode::Markdown))
            .await?;
        Ok(())
    }
}
