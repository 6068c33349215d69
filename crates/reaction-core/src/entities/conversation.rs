//! Conversation entity - a direct or group thread known to this client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{IdentityRef, Snowflake};

/// Conversation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    /// One-to-one conversation (including note-to-self)
    Direct,
    /// Group conversation
    Group,
}

/// Conversation entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Snowflake,
    pub kind: ConversationKind,
    /// Peer identity for direct conversations
    pub identity: Option<IdentityRef>,
    /// Note-to-self conversation
    pub is_me: bool,
    /// Messages linked into this conversation's list, oldest first
    pub message_ids: Vec<Snowflake>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a direct conversation with someone else
    pub fn new_direct(id: Snowflake, identity: IdentityRef) -> Self {
        Self {
            id,
            kind: ConversationKind::Direct,
            identity: Some(identity),
            is_me: false,
            message_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Create the note-to-self conversation
    pub fn new_self(id: Snowflake, identity: IdentityRef) -> Self {
        Self {
            is_me: true,
            ..Self::new_direct(id, identity)
        }
    }

    /// Create a group conversation
    pub fn new_group(id: Snowflake) -> Self {
        Self {
            id,
            kind: ConversationKind::Group,
            identity: None,
            is_me: false,
            message_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_direct(&self) -> bool {
        self.kind == ConversationKind::Direct
    }

    #[inline]
    pub fn is_self(&self) -> bool {
        self.is_me
    }

    /// Link a message into the list; returns false if it was already there
    pub fn link_message(&mut self, message_id: Snowflake) -> bool {
        if self.message_ids.contains(&message_id) {
            return false;
        }
        self.message_ids.push(message_id);
        true
    }
}
