//! Reaction entities - the decoded reaction record and the annotations it becomes

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::{IdentityRef, Snowflake};

/// A decoded reaction event waiting to be attached to its target message
///
/// The target is only known by author and send timestamp; which stored
/// message (and which conversation) that is gets decided later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub emoji: String,
    /// Retracts an earlier reaction with the same emoji from the same sender
    #[serde(default)]
    pub remove: bool,
    pub target_author: IdentityRef,
    pub target_timestamp: i64,
    /// When the reaction itself was sent (ms)
    pub timestamp: i64,
    /// Local identity of whoever sent the reaction
    pub sender_id: Snowflake,
    /// Conversation the carrying message arrived in
    pub from_conversation_id: Snowflake,
}

impl ReactionRecord {
    /// Create a new reaction record
    pub fn new(
        emoji: impl Into<String>,
        target_author: IdentityRef,
        target_timestamp: i64,
        timestamp: i64,
        sender_id: Snowflake,
        from_conversation_id: Snowflake,
    ) -> Self {
        Self {
            emoji: emoji.into(),
            remove: false,
            target_author,
            target_timestamp,
            timestamp,
            sender_id,
            from_conversation_id,
        }
    }

    /// Reject records that can never be applied
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.emoji.trim().is_empty() {
            return Err(DomainError::ValidationError("emoji is required".to_string()));
        }
        Ok(())
    }

    /// Turn this record into a retraction of the same emoji
    pub fn into_removal(mut self) -> Self {
        self.remove = true;
        self
    }

    /// Check whether this record targets the given author and send time
    #[inline]
    pub fn targets(&self, author: &IdentityRef, sent_at: i64) -> bool {
        self.target_timestamp == sent_at && &self.target_author == author
    }

    /// The annotation stored on the target message
    pub fn to_message_reaction(&self) -> MessageReaction {
        MessageReaction {
            emoji: self.emoji.clone(),
            from_id: self.sender_id,
            target_author: self.target_author.clone(),
            target_timestamp: self.target_timestamp,
            timestamp: self.timestamp,
        }
    }

    /// The metadata stored on a "reacted to your story" message
    pub fn to_story_reaction(&self) -> StoryReaction {
        StoryReaction {
            emoji: self.emoji.clone(),
            target_author: self.target_author.clone(),
            target_timestamp: self.target_timestamp,
        }
    }
}

/// A reaction attached in place to a message, at most one per sender
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReaction {
    pub emoji: String,
    pub from_id: Snowflake,
    pub target_author: IdentityRef,
    pub target_timestamp: i64,
    pub timestamp: i64,
}

/// Reaction metadata carried by a message that reacts to a story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryReaction {
    pub emoji: String,
    pub target_author: IdentityRef,
    pub target_timestamp: i64,
}

/// What attaching a reaction did to a message's reaction list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionChange {
    /// No earlier reaction from this sender
    Added,
    /// Replaced the sender's earlier reaction
    Replaced,
    /// Retracted the sender's reaction
    Removed,
    /// Stale or unmatched; nothing changed
    Ignored,
}

impl ReactionChange {
    /// Whether the message needs to be written back
    #[inline]
    pub fn is_modified(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}
