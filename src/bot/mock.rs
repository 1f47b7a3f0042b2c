use super::types::{MessageId, ParseMode, Update};
use super::Messenger;
use crate::models::ChatId;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Everything the mock was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SentItem {
    Message {
        chat_id: ChatId,
        text: String,
        parse_mode: Option<ParseMode>,
    },
    Photo {
        chat_id: ChatId,
        bytes: Vec<u8>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
}

#[derive(Clone)]
pub struct MockMessenger {
    sent: Arc<Mutex<Vec<SentItem>>>,
    updates: Arc<Mutex<VecDeque<Vec<Update>>>>,
    offsets: Arc<Mutex<Vec<Option<i64>>>>,
    next_message_id: Arc<Mutex<MessageId>>,
    fail_messages: bool,
    fail_photos: bool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(VecDeque::new())),
            offsets: Arc::new(Mutex::new(Vec::new())),
            next_message_id: Arc::new(Mutex::new(100)),
            fail_messages: false,
            fail_photos: false,
        }
    }

    /// Queues one batch returned by the next `get_updates` call.
    pub fn with_updates(self, batch: Vec<Update>) -> Self {
        self.updates.lock().unwrap().push_back(batch);
        self
    }

    pub fn with_message_failure(mut self, should_fail: bool) -> Self {
        self.fail_messages = should_fail;
        self
    }

    pub fn with_photo_failure(mut self, should_fail: bool) -> Self {
        self.fail_photos = should_fail;
        self
    }

    pub fn get_sent(&self) -> Vec<SentItem> {
        self.sent.lock().unwrap().clone()
    }

    /// Offsets passed to `get_updates`, in call order.
    pub fn get_offsets(&self) -> Vec<Option<i64>> {
        self.offsets.lock().unwrap().clone()
    }

    fn next_id(&self) -> MessageId {
        let mut id = self.next_message_id.lock().unwrap();
        *id += 1;
        *id
    }

    fn record(&self, item: SentItem) {
        self.sent.lock().unwrap().push(item);
    }
}

impl Default for MockMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<MessageId> {
        if self.fail_messages {
            return Err(Error::Messenger("Mock sendMessage failure".to_string()));
        }
        self.record(SentItem::Message {
            chat_id: chat_id.clone(),
            text: text.to_string(),
            parse_mode,
        });
        Ok(self.next_id())
    }

    async fn send_photo(&self, chat_id: &ChatId, photo: Vec<u8>) -> Result<MessageId> {
        if self.fail_photos {
            return Err(Error::Messenger("Mock sendPhoto failure".to_string()));
        }
        self.record(SentItem::Photo {
            chat_id: chat_id.clone(),
            bytes: photo,
        });
        Ok(self.next_id())
    }

    async fn edit_message_text(
        &self,
        chat_id: &ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<()> {
        self.record(SentItem::Edit {
            chat_id: chat_id.clone(),
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: &ChatId, message_id: MessageId) -> Result<()> {
        self.record(SentItem::Delete {
            chat_id: chat_id.clone(),
            message_id,
        });
        Ok(())
    }

    async fn get_updates(&self, offset: Option<i64>, _timeout_secs: u32) -> Result<Vec<Update>> {
        self.offsets.lock().unwrap().push(offset);
        Ok(self.updates.lock().unwrap().pop_front().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_messenger_assigns_increasing_ids() {
        let messenger = MockMessenger::new();
        let chat_id = ChatId::Id(1);

        let first = messenger.send_message(&chat_id, "a", None).await.unwrap();
        let second = messenger.send_photo(&chat_id, vec![1]).await.unwrap();

        assert!(second > first);
        assert_eq!(messenger.get_sent().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_messenger_drains_update_batches() {
        let messenger = MockMessenger::new().with_updates(vec![Update {
            update_id: 1,
            message: None,
        }]);

        assert_eq!(messenger.get_updates(None, 0).await.unwrap().len(), 1);
        assert!(messenger.get_updates(Some(2), 0).await.unwrap().is_empty());
        assert_eq!(messenger.get_offsets(), vec![None, Some(2)]);
    }
}
