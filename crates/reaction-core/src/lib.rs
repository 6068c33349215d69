//! # reaction-core
//!
//! Domain layer for reaction reconciliation: reaction records, the messages
//! and conversations they target, and the collaborator traits the engine
//! depends on. No runtime or storage dependencies live here.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Conversation, ConversationKind, Message, MessageDirection, MessageKind, MessageReaction,
    ReactionChange, ReactionRecord, StoryReaction,
};
pub use error::DomainError;
pub use traits::{
    ConversationDirectory, ConversationQueue, IdentityDirectory, JobCompletion, MessageStore,
    QueueJob, RepoResult, SaveOptions,
};
pub use value_objects::{IdentityRef, IdentityRefError, Snowflake, SnowflakeGenerator, SnowflakeParseError};
