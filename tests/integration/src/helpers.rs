//! Test helpers for integration tests
//!
//! Provides a harness wiring the engine to the in-memory store, with
//! shortcuts for delivering messages and receiving reactions.

use std::sync::Arc;

use anyhow::Result;
use futures::FutureExt;
use reaction_common::AppConfig;
use reaction_core::{Message, ReactionRecord, Snowflake, SnowflakeGenerator};
use reaction_service::{
    PendingReactionBuffer, ReactionContext, ReactionOutcome, ReconciliationEngine, SerialTaskQueue,
};
use reaction_store::{InMemoryDirectory, InMemoryMessageStore};
use tokio::sync::oneshot;

use crate::fixtures::{identity, Contact};

/// Identity of the local client in every harness
pub const SELF_IDENTITY: &str = "+15550000000";

/// Engine plus the in-memory collaborators behind it
pub struct Harness {
    pub engine: ReconciliationEngine,
    pub messages: Arc<InMemoryMessageStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub buffer: Arc<PendingReactionBuffer>,
}

impl Harness {
    /// Harness using the worker id from the environment config
    pub fn start() -> Result<Self> {
        let config = test_config()?;
        Ok(Self::with_worker_id(config.snowflake.worker_id))
    }

    pub fn with_worker_id(worker_id: u16) -> Self {
        let generator = Arc::new(SnowflakeGenerator::new(worker_id));
        let messages = Arc::new(InMemoryMessageStore::new());
        let directory = Arc::new(InMemoryDirectory::new(
            Arc::clone(&messages),
            Arc::clone(&generator),
            identity(SELF_IDENTITY),
        ));
        let buffer = Arc::new(PendingReactionBuffer::new());

        let ctx = ReactionContext::new(
            directory.clone(),
            messages.clone(),
            directory.clone(),
            Arc::new(SerialTaskQueue::new()),
            Arc::clone(&buffer),
            generator,
        );

        Self {
            engine: ReconciliationEngine::new(ctx),
            messages,
            directory,
            buffer,
        }
    }

    /// Register a contact and its direct conversation
    pub fn contact(&self, raw: &str) -> Contact {
        let identity = identity(raw);
        let id = self
            .directory
            .contact(&identity)
            .unwrap_or_else(|| panic!("contact {raw} is forbidden"));
        Contact { identity, id }
    }

    pub fn self_id(&self) -> Snowflake {
        self.directory.self_id()
    }

    pub fn next_id(&self) -> Snowflake {
        self.engine.context().generate_id()
    }

    /// Store an incoming message without running ingestion
    pub fn store_incoming(&self, author: &Contact, conversation_id: Snowflake, sent_at: i64) -> Message {
        let message =
            Message::new_incoming(self.next_id(), conversation_id, author.id, author.identity.clone(), sent_at);
        self.messages.insert(message.clone());
        message
    }

    /// Store one of our own sent messages
    pub fn store_outgoing(&self, conversation_id: Snowflake, sent_at: i64) -> Message {
        let message = Message::new_outgoing(self.next_id(), conversation_id, self.self_id(), sent_at);
        self.messages.insert(message.clone());
        message
    }

    /// Store a message and run ingestion on its conversation's queue
    pub async fn deliver(&self, message: Message) -> (Message, usize) {
        let engine = self.engine.clone();
        let messages = Arc::clone(&self.messages);
        let conversation_id = message.conversation_id;
        let (tx, rx) = oneshot::channel();

        let job = async move {
            let mut message = message;
            messages.insert(message.clone());
            let claimed = engine.on_message_arrived(&mut message).await;
            let _ = tx.send((message, claimed));
        }
        .boxed();

        self.engine
            .context()
            .queue()
            .enqueue(conversation_id, "test.ingest", job)
            .await
            .expect("ingestion job not scheduled");
        rx.await.expect("ingestion job did not finish")
    }

    /// Hold a conversation's queue until the returned sender fires or drops
    pub async fn block_queue(&self, conversation_id: Snowflake) -> oneshot::Sender<()> {
        let (release, wait) = oneshot::channel::<()>();
        let (started_tx, started) = oneshot::channel();
        let job = async move {
            let _ = started_tx.send(());
            let _ = wait.await;
        }
        .boxed();

        // Completion is not awaited; the job runs once scheduled
        drop(self.engine.context().queue().enqueue(conversation_id, "test.block", job));
        started.await.expect("blocking job did not start");
        release
    }

    /// Receive a reaction, with a freshly generated carrier message
    pub async fn react(&self, record: ReactionRecord) -> ReactionOutcome {
        let carrier = Message::reaction_placeholder(self.next_id(), &record);
        self.engine.on_reaction(record, carrier).await
    }

    /// Stored copy of a message
    pub fn stored(&self, id: Snowflake) -> Message {
        self.messages
            .find_by_id(id)
            .unwrap_or_else(|| panic!("message {id} not stored"))
    }
}

/// Load test configuration
pub fn test_config() -> Result<AppConfig> {
    let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;

    Ok(config)
}
