//! Target resolver
//!
//! Works out which stored message a reaction record points at and which
//! conversation the reaction should be applied in.

use std::fmt;

use tracing::{debug, error, instrument};

use reaction_core::traits::RepoResult;
use reaction_core::{Conversation, DomainError, Message, ReactionRecord, Snowflake};

use super::context::ReactionContext;

/// The message a reaction targets, classified once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionTarget {
    /// Reaction is attached to the message itself
    Ordinary(Message),
    /// Reaction becomes a new "reacted to your story" message
    Story(Message),
}

impl ReactionTarget {
    pub fn classify(message: Message) -> Self {
        if message.is_story() {
            Self::Story(message)
        } else {
            Self::Ordinary(message)
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            Self::Ordinary(message) | Self::Story(message) => message,
        }
    }

    #[inline]
    pub fn is_story(&self) -> bool {
        matches!(self, Self::Story(_))
    }
}

/// Where a reaction goes
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// Conversation whose queue applies the reaction
    pub conversation: Conversation,
    pub target: ReactionTarget,
}

/// Why a reaction was discarded without being applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Record is malformed (empty emoji)
    InvalidRecord,
    /// No local identity can be derived for the target author
    UnknownAuthor,
    /// Target message exists but no conversation holds it
    NoTargetConversation,
    /// A directory or store lookup failed
    LookupFailed,
    /// The conversation's queue would not take the job
    QueueUnavailable,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::InvalidRecord => "invalid record",
            Self::UnknownAuthor => "target author cannot be resolved",
            Self::NoTargetConversation => "no target conversation",
            Self::LookupFailed => "target lookup failed",
            Self::QueueUnavailable => "conversation queue unavailable",
        };
        f.write_str(reason)
    }
}

/// Result of resolving one record
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(ResolvedTarget),
    /// Target message not known yet; try again when it arrives
    Pending,
    /// Will never resolve
    Unresolvable(DropReason),
}

impl Resolution {
    /// Resolution for a failed resolver step
    ///
    /// A missing target message is the only failure worth waiting on.
    /// Collaborator errors discard the record, since a target that is
    /// already stored will not arrive again to claim it.
    pub fn from_error(err: &DomainError) -> Self {
        match err {
            DomainError::TargetMessageNotFound { .. } => Self::Pending,
            DomainError::IdentityUnresolvable(_) => Self::Unresolvable(DropReason::UnknownAuthor),
            _ => {
                error!(error = %err, code = err.code(), "Target lookup failed");
                Self::Unresolvable(DropReason::LookupFailed)
            }
        }
    }
}

/// Target resolver
pub struct TargetResolver<'a> {
    ctx: &'a ReactionContext,
}

impl<'a> TargetResolver<'a> {
    /// Create a new TargetResolver
    pub fn new(ctx: &'a ReactionContext) -> Self {
        Self { ctx }
    }

    /// Resolve a record to its target message and conversation
    #[instrument(
        skip(self, record),
        fields(target_timestamp = record.target_timestamp, sender_id = %record.sender_id)
    )]
    pub async fn resolve(&self, record: &ReactionRecord) -> Resolution {
        match self.resolve_author(record).await {
            Ok(author_id) => self.resolve_for_author(record, author_id).await,
            Err(e) => Resolution::from_error(&e),
        }
    }

    /// Map the record's target author to a local identity id
    pub async fn resolve_author(&self, record: &ReactionRecord) -> RepoResult<Snowflake> {
        self.ctx
            .identities()
            .lookup_or_create(&record.target_author)
            .await?
            .ok_or_else(|| DomainError::IdentityUnresolvable(record.target_author.clone()))
    }

    /// Everything after author resolution: candidate message, story
    /// exception and target conversation
    pub async fn resolve_for_author(&self, record: &ReactionRecord, author_id: Snowflake) -> Resolution {
        let message = match self.find_target_message(author_id, record.target_timestamp).await {
            Ok(message) => message,
            Err(e) => return Resolution::from_error(&e),
        };
        let target = ReactionTarget::classify(message);

        match self.target_conversation(record, target.message(), author_id).await {
            Ok(Some(conversation)) => Resolution::Resolved(ResolvedTarget {
                conversation,
                target,
            }),
            Ok(None) => Resolution::Unresolvable(DropReason::NoTargetConversation),
            Err(e) => Resolution::from_error(&e),
        }
    }

    /// Stored message sent by `author_id` at `sent_at`
    pub async fn find_target_message(&self, author_id: Snowflake, sent_at: i64) -> RepoResult<Message> {
        self.ctx
            .messages()
            .find_by_sent_at(sent_at)
            .await?
            .into_iter()
            .find(|m| m.author_id == author_id)
            .ok_or(DomainError::TargetMessageNotFound {
                author: author_id,
                sent_at,
            })
    }

    /// Conversation a reaction to `target` is applied in
    ///
    /// Story reactions received in a direct conversation with someone else
    /// go to that conversation; everything else goes wherever the target
    /// message lives.
    pub async fn target_conversation(
        &self,
        record: &ReactionRecord,
        target: &Message,
        author_id: Snowflake,
    ) -> RepoResult<Option<Conversation>> {
        if target.is_story() {
            if let Some(conversation) = self.story_conversation(record).await? {
                debug!(conversation_id = %conversation.id, "Story reaction goes to sending conversation");
                return Ok(Some(conversation));
            }
        }

        self.ctx
            .conversations()
            .find_for_target_message(author_id, record.target_timestamp)
            .await
    }

    /// The sending conversation, if it is a direct chat with someone else
    async fn story_conversation(&self, record: &ReactionRecord) -> RepoResult<Option<Conversation>> {
        let conversation = self.ctx.conversations().get(record.from_conversation_id).await?;
        Ok(conversation.filter(|c| c.is_direct() && !c.is_self()))
    }
}
