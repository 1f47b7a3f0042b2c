use super::Messenger;
use crate::models::{ChatId, GenerationRequest};
use crate::pipeline::Pipeline;
use crate::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PROCESSING_MESSAGE: &str = "Generating image, please wait...";
pub const FAILURE_MESSAGE: &str = "Sorry, an error occurred while generating the image.";

/// Runs a generation job on behalf of a chat and reports progress there.
pub struct BotHandler {
    pipeline: Arc<Pipeline>,
    messenger: Arc<dyn Messenger>,
}

impl BotHandler {
    pub fn new(pipeline: Arc<Pipeline>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            pipeline,
            messenger,
        }
    }

    /// Posts a wait notice, generates, sends the photo and clears the notice.
    ///
    /// On failure the notice is replaced by a generic apology and the
    /// underlying error is returned for logging.
    pub async fn handle_trigger(&self, chat_id: ChatId, request: GenerationRequest) -> Result<()> {
        let notice_id = self
            .messenger
            .send_message(&chat_id, PROCESSING_MESSAGE, None)
            .await?;
        info!("Started generation for chat {}", chat_id);

        // The pipeline logs its own failures; only delivery is logged here.
        let outcome = match self.pipeline.generate(&request).await {
            Ok(png) => self
                .messenger
                .send_photo(&chat_id, png)
                .await
                .map(|_| ())
                .inspect_err(|e| error!("Failed to deliver meme to chat {}: {}", chat_id, e)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = self.messenger.delete_message(&chat_id, notice_id).await {
                    warn!("Failed to remove wait notice in chat {}: {}", chat_id, e);
                }
                info!("Delivered meme to chat {}", chat_id);
                Ok(())
            }
            Err(e) => {
                warn!("Job for chat {} failed, notifying chat", chat_id);
                if let Err(edit_err) = self
                    .messenger
                    .edit_message_text(&chat_id, notice_id, FAILURE_MESSAGE)
                    .await
                {
                    warn!(
                        "Failed to report failure in chat {}: {}",
                        chat_id, edit_err
                    );
                }
                Err(e)
            }
        }
    }
}
