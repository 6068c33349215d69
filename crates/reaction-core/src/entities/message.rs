//! Message entity - a stored chat message as seen by the reaction engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::reaction::{MessageReaction, ReactionChange, ReactionRecord, StoryReaction};
use crate::value_objects::{IdentityRef, Snowflake};

/// Whether the message was sent by this client or received
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

/// Message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Normal,
    Story,
}

/// Message entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Snowflake,
    pub conversation_id: Snowflake,
    /// Local identity of the sender
    pub author_id: Snowflake,
    /// Sender's wire identity, when known
    pub source: Option<IdentityRef>,
    pub direction: MessageDirection,
    pub kind: MessageKind,
    /// Sender-assigned send time (ms)
    pub sent_at: i64,
    pub received_at: DateTime<Utc>,
    pub body: Option<String>,
    pub reactions: Vec<MessageReaction>,
    /// Story this message reacts to
    pub story_id: Option<Snowflake>,
    pub story_reaction: Option<StoryReaction>,
}

impl Message {
    /// Create a message received from someone else
    pub fn new_incoming(
        id: Snowflake,
        conversation_id: Snowflake,
        author_id: Snowflake,
        source: IdentityRef,
        sent_at: i64,
    ) -> Self {
        Self {
            id,
            conversation_id,
            author_id,
            source: Some(source),
            direction: MessageDirection::Incoming,
            kind: MessageKind::Normal,
            sent_at,
            received_at: Utc::now(),
            body: None,
            reactions: Vec::new(),
            story_id: None,
            story_reaction: None,
        }
    }

    /// Create a message sent by this client
    pub fn new_outgoing(
        id: Snowflake,
        conversation_id: Snowflake,
        self_id: Snowflake,
        sent_at: i64,
    ) -> Self {
        Self {
            id,
            conversation_id,
            author_id: self_id,
            source: None,
            direction: MessageDirection::Outgoing,
            kind: MessageKind::Normal,
            sent_at,
            received_at: Utc::now(),
            body: None,
            reactions: Vec::new(),
            story_id: None,
            story_reaction: None,
        }
    }

    /// Placeholder for the message that carried a reaction
    ///
    /// Only persisted when the reaction targets a story.
    pub fn reaction_placeholder(id: Snowflake, record: &ReactionRecord) -> Self {
        Self {
            id,
            conversation_id: record.from_conversation_id,
            author_id: record.sender_id,
            source: None,
            direction: MessageDirection::Incoming,
            kind: MessageKind::Normal,
            sent_at: record.timestamp,
            received_at: Utc::now(),
            body: None,
            reactions: Vec::new(),
            story_id: None,
            story_reaction: None,
        }
    }

    /// Mark the message as a story post
    pub fn into_story(mut self) -> Self {
        self.kind = MessageKind::Story;
        self
    }

    /// Set the message body
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[inline]
    pub fn is_story(&self) -> bool {
        self.kind == MessageKind::Story
    }

    #[inline]
    pub fn is_outgoing(&self) -> bool {
        self.direction == MessageDirection::Outgoing
    }

    /// The reaction currently attached by a sender
    pub fn reaction_from(&self, sender_id: Snowflake) -> Option<&MessageReaction> {
        self.reactions.iter().find(|r| r.from_id == sender_id)
    }

    /// Attach or retract a reaction, keyed by sender
    ///
    /// A sender holds at most one reaction per message. A record older than
    /// the sender's stored reaction is ignored; otherwise the newest applied
    /// record wins.
    pub fn apply_reaction(&mut self, record: &ReactionRecord) -> ReactionChange {
        let existing = self
            .reactions
            .iter()
            .position(|r| r.from_id == record.sender_id);

        if let Some(index) = existing {
            if self.reactions[index].timestamp > record.timestamp {
                return ReactionChange::Ignored;
            }
        }

        match (existing, record.remove) {
            (Some(index), true) if self.reactions[index].emoji == record.emoji => {
                self.reactions.remove(index);
                ReactionChange::Removed
            }
            (_, true) => ReactionChange::Ignored,
            (Some(index), false) => {
                self.reactions[index] = record.to_message_reaction();
                ReactionChange::Replaced
            }
            (None, false) => {
                self.reactions.push(record.to_message_reaction());
                ReactionChange::Added
            }
        }
    }

    /// Turn this message into a "reacted to your story" message
    pub fn attach_story_reaction(&mut self, story: &Message, record: &ReactionRecord) {
        self.story_id = Some(story.id);
        self.story_reaction = Some(record.to_story_reaction());
    }
}
