//! In-memory world the scenarios run in

use std::sync::Arc;

use anyhow::Result;
use reaction_core::{IdentityRef, Message, ReactionRecord, Snowflake, SnowflakeGenerator};
use reaction_service::{ReactionContext, ReactionOutcome, ReconciliationEngine, SerialTaskQueue};
use reaction_store::{InMemoryDirectory, InMemoryMessageStore};

pub struct World {
    pub engine: ReconciliationEngine,
    pub messages: Arc<InMemoryMessageStore>,
    pub directory: Arc<InMemoryDirectory>,
}

impl World {
    pub fn new(worker_id: u16) -> Result<Self> {
        let generator = Arc::new(SnowflakeGenerator::new(worker_id));
        let messages = Arc::new(InMemoryMessageStore::new());
        let directory = Arc::new(InMemoryDirectory::new(
            Arc::clone(&messages),
            Arc::clone(&generator),
            IdentityRef::parse("+15550000000")?,
        ));

        let ctx = ReactionContext::builder()
            .identities(directory.clone())
            .conversations(directory.clone())
            .messages(messages.clone())
            .queue(Arc::new(SerialTaskQueue::new()))
            .snowflake_generator(generator)
            .build()?;

        Ok(Self {
            engine: ReconciliationEngine::new(ctx),
            messages,
            directory,
        })
    }

    /// Local id for a contact, creating their direct conversation
    pub fn contact(&self, identity: &str) -> Result<(IdentityRef, Snowflake)> {
        let identity = IdentityRef::parse(identity)?;
        let id = self
            .directory
            .contact(&identity)
            .ok_or_else(|| anyhow::anyhow!("contact {identity} cannot be resolved"))?;
        Ok((identity, id))
    }

    /// Deliver a message from `author` into `conversation_id` through ingestion
    pub async fn deliver(
        &self,
        author: &(IdentityRef, Snowflake),
        conversation_id: Snowflake,
        sent_at: i64,
    ) -> Message {
        let mut message = Message::new_incoming(
            self.engine.context().generate_id(),
            conversation_id,
            author.1,
            author.0.clone(),
            sent_at,
        );
        self.messages.insert(message.clone());
        self.engine.on_message_arrived(&mut message).await;
        message
    }

    /// Receive a reaction carried by a message in the sender's conversation
    pub async fn react(&self, record: ReactionRecord) -> ReactionOutcome {
        let carrier = Message::reaction_placeholder(self.engine.context().generate_id(), &record);
        self.engine.on_reaction(record, carrier).await
    }

    pub fn pending(&self) -> usize {
        self.engine.context().buffer().len()
    }
}
