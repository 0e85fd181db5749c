//! Append-only log of every ingested message.
//!
//! The log is the canonical owner of `paired` flags: pairing marks the
//! logged copies, and a clear-pairs epoch rollover resets them so the
//! retained raw messages become eligible for a fresh pairing epoch.

use tokio::sync::RwLock;

use super::message::{Message, MessageId};

/// In-memory record of all ingested messages, in arrival order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: RwLock<Vec<Message>>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub async fn record(&self, message: Message) {
        self.messages.write().await.push(message);
    }

    /// Returns all messages in arrival order.
    pub async fn list(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Marks the logged copy of a message as paired.
    pub async fn mark_paired(&self, id: MessageId) {
        let mut messages = self.messages.write().await;
        if let Some(message) = messages.iter_mut().find(|m| m.id == id) {
            message.paired = true;
        }
    }

    /// Resets every `paired` flag, starting a new pairing epoch.
    pub async fn reset_paired_flags(&self) {
        let mut messages = self.messages.write().await;
        for message in messages.iter_mut() {
            message.paired = false;
        }
    }

    /// Removes every message.
    pub async fn clear(&self) {
        self.messages.write().await.clear();
    }

    /// Returns the total number of logged messages.
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Returns `true` when the log is empty.
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    /// Returns the number of messages not yet consumed into a pair.
    pub async fn unpaired_count(&self) -> usize {
        self.messages.read().await.iter().filter(|m| !m.paired).count()
    }
}
