//! Repository traits (ports) - the lookups and writes the reaction engine needs
//!
//! The domain layer defines what it needs; the host application (or the
//! in-memory implementations in `reaction-store`) provides it.

use async_trait::async_trait;

use crate::entities::{Conversation, Message};
use crate::error::DomainError;
use crate::value_objects::{IdentityRef, Snowflake};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Identity Directory
// ============================================================================

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve a wire identity to a local identity id, creating a minimal
    /// placeholder record if none exists yet
    ///
    /// Returns `None` when no identity can be derived. Must be idempotent and
    /// safe to call concurrently for the same reference.
    async fn lookup_or_create(&self, identity: &IdentityRef) -> RepoResult<Option<Snowflake>>;
}

// ============================================================================
// Message Store
// ============================================================================

/// Options for persisting a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Insert the message even if the store has never seen its id
    pub force_overwrite: bool,
}

impl SaveOptions {
    /// Options for writing a brand new message
    pub const fn force() -> Self {
        Self {
            force_overwrite: true,
        }
    }
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All stored messages with the given sender-assigned send time, across
    /// every conversation
    async fn find_by_sent_at(&self, sent_at: i64) -> RepoResult<Vec<Message>>;

    /// Persist a message and return its id
    ///
    /// Without `force_overwrite` this is an update and fails with
    /// `MessageNotFound` when the message is not stored.
    async fn save(&self, message: &Message, options: SaveOptions) -> RepoResult<Snowflake>;
}

// ============================================================================
// Conversation Directory
// ============================================================================

#[async_trait]
pub trait ConversationDirectory: Send + Sync {
    /// Find conversation by ID
    async fn get(&self, id: Snowflake) -> RepoResult<Option<Conversation>>;

    /// Find the conversation holding the message `author_id` sent at
    /// `sent_at`
    async fn find_for_target_message(
        &self,
        author_id: Snowflake,
        sent_at: i64,
    ) -> RepoResult<Option<Conversation>>;

    /// Append a message to a conversation's message list
    async fn link_message(&self, conversation_id: Snowflake, message_id: Snowflake) -> RepoResult<()>;
}
