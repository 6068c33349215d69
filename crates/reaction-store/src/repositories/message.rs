//! In-memory implementation of MessageStore

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::instrument;

use reaction_core::entities::Message;
use reaction_core::error::DomainError;
use reaction_core::traits::{MessageStore, RepoResult, SaveOptions};
use reaction_core::value_objects::Snowflake;

#[derive(Default)]
struct Messages {
    by_id: HashMap<Snowflake, Message>,
    by_sent_at: HashMap<i64, BTreeSet<Snowflake>>,
}

impl Messages {
    fn put(&mut self, message: Message) {
        let previous = self.by_id.get(&message.id).map(|m| m.sent_at);
        if let Some(sent_at) = previous.filter(|&sent_at| sent_at != message.sent_at) {
            self.unindex(sent_at, message.id);
        }
        self.by_sent_at
            .entry(message.sent_at)
            .or_default()
            .insert(message.id);
        self.by_id.insert(message.id, message);
    }

    fn take(&mut self, id: Snowflake) -> Option<Message> {
        let message = self.by_id.remove(&id)?;
        self.unindex(message.sent_at, id);
        Some(message)
    }

    fn unindex(&mut self, sent_at: i64, id: Snowflake) {
        if let Some(ids) = self.by_sent_at.get_mut(&sent_at) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_sent_at.remove(&sent_at);
            }
        }
    }
}

/// In-memory implementation of MessageStore, indexed by id and send time
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: RwLock<Messages>,
    fail_writes: AtomicBool,
}

impl InMemoryMessageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Find message by ID
    pub fn find_by_id(&self, id: Snowflake) -> Option<Message> {
        self.messages.read().by_id.get(&id).cloned()
    }

    /// Store a message as delivered by ingestion, replacing any earlier copy
    pub fn insert(&self, message: Message) {
        self.messages.write().put(message);
    }

    /// Delete a message, returning it if it was stored
    pub fn remove(&self, id: Snowflake) -> Option<Message> {
        self.messages.write().take(id)
    }

    /// Number of stored messages
    pub fn len(&self) -> usize {
        self.messages.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().by_id.is_empty()
    }

    /// Make every subsequent `save` fail, to simulate a broken disk
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    #[instrument(skip(self))]
    async fn find_by_sent_at(&self, sent_at: i64) -> RepoResult<Vec<Message>> {
        let messages = self.messages.read();
        let Some(ids) = messages.by_sent_at.get(&sent_at) else {
            return Ok(Vec::new());
        };

        Ok(ids
            .iter()
            .filter_map(|id| messages.by_id.get(id).cloned())
            .collect())
    }

    #[instrument(skip(self, message), fields(message_id = %message.id))]
    async fn save(&self, message: &Message, options: SaveOptions) -> RepoResult<Snowflake> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::StoreError(format!(
                "write rejected for message {}",
                message.id
            )));
        }

        let mut messages = self.messages.write();
        if !options.force_overwrite && !messages.by_id.contains_key(&message.id) {
            return Err(DomainError::MessageNotFound(message.id));
        }
        messages.put(message.clone());

        Ok(message.id)
    }
}
