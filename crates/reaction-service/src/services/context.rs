//! Reaction context - dependency container for the reconciliation services
//!
//! Holds the collaborators the engine needs and the one pending-reaction
//! buffer shared by both entry points.

use std::sync::Arc;

use reaction_core::traits::{
    ConversationDirectory, ConversationQueue, IdentityDirectory, MessageStore,
};
use reaction_core::{Snowflake, SnowflakeGenerator};

use super::error::{ServiceError, ServiceResult};
use super::pending::PendingReactionBuffer;

/// Reaction context containing all dependencies
///
/// Cheap to clone; every collaborator sits behind an `Arc`, so clones share
/// the same buffer and queue.
#[derive(Clone)]
pub struct ReactionContext {
    identities: Arc<dyn IdentityDirectory>,
    messages: Arc<dyn MessageStore>,
    conversations: Arc<dyn ConversationDirectory>,
    queue: Arc<dyn ConversationQueue>,
    buffer: Arc<PendingReactionBuffer>,
    snowflake_generator: Arc<SnowflakeGenerator>,
}

impl ReactionContext {
    /// Create a new context with all dependencies
    pub fn new(
        identities: Arc<dyn IdentityDirectory>,
        messages: Arc<dyn MessageStore>,
        conversations: Arc<dyn ConversationDirectory>,
        queue: Arc<dyn ConversationQueue>,
        buffer: Arc<PendingReactionBuffer>,
        snowflake_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            identities,
            messages,
            conversations,
            queue,
            buffer,
            snowflake_generator,
        }
    }

    /// Start building a context
    pub fn builder() -> ReactionContextBuilder {
        ReactionContextBuilder::new()
    }

    /// Get the identity directory
    pub fn identities(&self) -> &dyn IdentityDirectory {
        self.identities.as_ref()
    }

    /// Get the message store
    pub fn messages(&self) -> &dyn MessageStore {
        self.messages.as_ref()
    }

    /// Get the conversation directory
    pub fn conversations(&self) -> &dyn ConversationDirectory {
        self.conversations.as_ref()
    }

    /// Get the per-conversation task queue
    pub fn queue(&self) -> &dyn ConversationQueue {
        self.queue.as_ref()
    }

    /// Get the pending reaction buffer
    pub fn buffer(&self) -> &PendingReactionBuffer {
        self.buffer.as_ref()
    }

    /// Shared handle to the pending reaction buffer
    pub fn shared_buffer(&self) -> Arc<PendingReactionBuffer> {
        Arc::clone(&self.buffer)
    }

    /// Generate a new Snowflake ID
    pub fn generate_id(&self) -> Snowflake {
        self.snowflake_generator.generate()
    }
}

impl std::fmt::Debug for ReactionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionContext")
            .field("collaborators", &"...")
            .field("pending", &self.buffer.len())
            .finish()
    }
}

/// Builder for creating a ReactionContext
///
/// The buffer and generator are optional; a fresh buffer and a worker-0
/// generator are used when they are not supplied.
#[derive(Default)]
pub struct ReactionContextBuilder {
    identities: Option<Arc<dyn IdentityDirectory>>,
    messages: Option<Arc<dyn MessageStore>>,
    conversations: Option<Arc<dyn ConversationDirectory>>,
    queue: Option<Arc<dyn ConversationQueue>>,
    buffer: Option<Arc<PendingReactionBuffer>>,
    snowflake_generator: Option<Arc<SnowflakeGenerator>>,
}

impl ReactionContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn identities(mut self, identities: Arc<dyn IdentityDirectory>) -> Self {
        self.identities = Some(identities);
        self
    }

    pub fn messages(mut self, messages: Arc<dyn MessageStore>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn conversations(mut self, conversations: Arc<dyn ConversationDirectory>) -> Self {
        self.conversations = Some(conversations);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn ConversationQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn buffer(mut self, buffer: Arc<PendingReactionBuffer>) -> Self {
        self.buffer = Some(buffer);
        self
    }

    pub fn snowflake_generator(mut self, generator: Arc<SnowflakeGenerator>) -> Self {
        self.snowflake_generator = Some(generator);
        self
    }

    /// Build the ReactionContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ReactionContext> {
        Ok(ReactionContext::new(
            self.identities
                .ok_or_else(|| ServiceError::validation("identities is required"))?,
            self.messages
                .ok_or_else(|| ServiceError::validation("messages is required"))?,
            self.conversations
                .ok_or_else(|| ServiceError::validation("conversations is required"))?,
            self.queue
                .ok_or_else(|| ServiceError::validation("queue is required"))?,
            self.buffer.unwrap_or_default(),
            self.snowflake_generator.unwrap_or_default(),
        ))
    }
}
