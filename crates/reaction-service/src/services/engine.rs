//! Reconciliation engine
//!
//! Entry points for reactions coming off the network and for messages that
//! just became known locally. Both meet in the pending buffer; whichever
//! path claims a record first applies it.

use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

use reaction_core::traits::{RepoResult, SaveOptions};
use reaction_core::{DomainError, Message, ReactionChange, ReactionRecord, Snowflake};

use super::context::ReactionContext;
use super::pending::{PendingId, PendingReaction};
use super::resolver::{DropReason, ReactionTarget, Resolution, ResolvedTarget, TargetResolver};

const APPLY_LABEL: &str = "reactions.on_reaction";
const OUTGOING_LABEL: &str = "reactions.outgoing";

/// What `on_reaction` did with a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionOutcome {
    /// Target is one of our own sent messages; these records were claimed
    /// and applied on its conversation
    Outgoing {
        conversation_id: Snowflake,
        claimed: Vec<ReactionRecord>,
    },
    /// Resolved and run through the target conversation's queue
    Handled {
        conversation_id: Snowflake,
        apply: ApplyOutcome,
    },
    /// Target message not known yet; the record waits in the buffer
    Pending,
    /// Discarded for good
    Dropped(DropReason),
}

/// Result of one apply step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Reaction attached to (or retracted from) the target message
    Attached(ReactionChange),
    /// New message reacting to a story, with its id
    StoryReply(Snowflake),
    /// Another path applied the record first
    AlreadyClaimed,
    /// Store or directory failure; the record is discarded
    Failed,
}

/// Reconciliation engine
#[derive(Clone, Debug)]
pub struct ReconciliationEngine {
    ctx: ReactionContext,
}

impl ReconciliationEngine {
    /// Create a new ReconciliationEngine
    pub fn new(ctx: ReactionContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ReactionContext {
        &self.ctx
    }

    /// Handle a reaction received from the network
    ///
    /// `generated` is the message that carried the reaction. It is only
    /// persisted when the target turns out to be a story.
    #[instrument(
        skip(self, record, generated),
        fields(
            emoji = %record.emoji,
            target_timestamp = record.target_timestamp,
            sender_id = %record.sender_id
        )
    )]
    pub async fn on_reaction(&self, record: ReactionRecord, generated: Message) -> ReactionOutcome {
        if let Err(e) = record.validate() {
            warn!(error = %e, code = e.code(), "Dropping invalid reaction");
            return ReactionOutcome::Dropped(DropReason::InvalidRecord);
        }

        // Parked before any lookup so a message arriving meanwhile can claim it
        let pending_id = self.ctx.buffer().insert(record.clone());

        if let Some(message) = self.find_outgoing_target(record.target_timestamp).await {
            return self.apply_outgoing(message).await;
        }

        let resolver = TargetResolver::new(&self.ctx);
        let resolution = match resolver.resolve_author(&record).await {
            Ok(author_id) => {
                // Set before the candidate lookup: a message stored after it
                // is claimed by local id, one stored before it is found here
                self.ctx.buffer().set_author(pending_id, author_id);
                resolver.resolve_for_author(&record, author_id).await
            }
            Err(e) => Resolution::from_error(&e),
        };

        let resolved = match resolution {
            Resolution::Resolved(resolved) => resolved,
            Resolution::Pending => {
                info!("Target message not found yet, reaction kept pending");
                return ReactionOutcome::Pending;
            }
            Resolution::Unresolvable(reason) => {
                self.ctx.buffer().remove(pending_id);
                warn!(reason = %reason, "Dropping reaction");
                return ReactionOutcome::Dropped(reason);
            }
        };

        let conversation_id = resolved.conversation.id;
        let (tx, rx) = oneshot::channel();
        let engine = self.clone();
        let job = async move {
            let outcome = engine.apply_pending(pending_id, resolved, generated).await;
            // Caller may have stopped waiting
            let _ = tx.send(outcome);
        }
        .boxed();

        if let Err(e) = self.ctx.queue().enqueue(conversation_id, APPLY_LABEL, job).await {
            self.ctx.buffer().remove(pending_id);
            error!(conversation_id = %conversation_id, error = %e, "Dropping reaction");
            return ReactionOutcome::Dropped(DropReason::QueueUnavailable);
        }

        let apply = rx.await.unwrap_or(ApplyOutcome::Failed);
        ReactionOutcome::Handled {
            conversation_id,
            apply,
        }
    }

    /// Claim and apply reactions that arrived before `message`
    ///
    /// Called from ingestion, which already runs serialized for the
    /// message's conversation, so the records are applied inline and the
    /// message is updated in place. Returns the number of records claimed.
    #[instrument(skip(self, message), fields(message_id = %message.id, sent_at = message.sent_at))]
    pub async fn on_message_arrived(&self, message: &mut Message) -> usize {
        let claimed = self.ctx.buffer().find_early_matches(message);
        if claimed.is_empty() {
            return 0;
        }

        let count = claimed.len();
        let records: Vec<ReactionRecord> = claimed.into_iter().map(|p| p.record).collect();
        for outcome in self.apply_claimed(message, &records).await {
            debug!(outcome = ?outcome, "Early reaction processed");
        }

        info!(claimed = count, "Applied early reactions");
        count
    }

    /// One of our own sent messages with this send time
    async fn find_outgoing_target(&self, sent_at: i64) -> Option<Message> {
        match self.ctx.messages().find_by_sent_at(sent_at).await {
            Ok(candidates) => candidates.into_iter().find(Message::is_outgoing),
            Err(e) => {
                warn!(sent_at, error = %e, code = e.code(), "Outgoing message lookup failed");
                None
            }
        }
    }

    /// Claim everything aimed at our own message and apply it on the
    /// message's conversation
    async fn apply_outgoing(&self, message: Message) -> ReactionOutcome {
        let conversation_id = message.conversation_id;
        let records: Vec<ReactionRecord> = self
            .ctx
            .buffer()
            .find_early_matches(&message)
            .into_iter()
            .map(|p| p.record)
            .collect();

        if records.is_empty() {
            debug!(message_id = %message.id, "Outgoing reactions already claimed");
            return ReactionOutcome::Outgoing {
                conversation_id,
                claimed: records,
            };
        }

        let engine = self.clone();
        let job_records = records.clone();
        let job = async move {
            match engine.refetch(&message).await {
                Ok(mut current) => {
                    for outcome in engine.apply_claimed(&mut current, &job_records).await {
                        debug!(message_id = %current.id, outcome = ?outcome, "Outgoing reaction processed");
                    }
                }
                Err(e) => log_apply_failure(&e),
            }
        }
        .boxed();

        if let Err(e) = self.ctx.queue().enqueue(conversation_id, OUTGOING_LABEL, job).await {
            error!(conversation_id = %conversation_id, error = %e, "Outgoing reactions not applied");
        }

        ReactionOutcome::Outgoing {
            conversation_id,
            claimed: records,
        }
    }

    /// Apply records already claimed for `message`
    ///
    /// Ordinary reactions are collected and written back once.
    async fn apply_claimed(&self, message: &mut Message, records: &[ReactionRecord]) -> Vec<ApplyOutcome> {
        let mut outcomes = Vec::with_capacity(records.len());
        let mut modified = false;

        for record in records {
            if message.is_story() {
                let outcome = match self.story_target_conversation(record, message).await {
                    Ok(conversation_id) => {
                        let reply = Message::reaction_placeholder(self.ctx.generate_id(), record);
                        self.reply_to_story(message, record, reply, conversation_id).await
                    }
                    Err(e) => Err(e),
                };
                outcomes.push(outcome.unwrap_or_else(|e| {
                    log_apply_failure(&e);
                    ApplyOutcome::Failed
                }));
            } else {
                let change = message.apply_reaction(record);
                modified |= change.is_modified();
                outcomes.push(ApplyOutcome::Attached(change));
            }
        }

        if modified {
            if let Err(e) = self.ctx.messages().save(message, SaveOptions::force()).await {
                log_apply_failure(&e);
                for outcome in &mut outcomes {
                    if matches!(outcome, ApplyOutcome::Attached(_)) {
                        *outcome = ApplyOutcome::Failed;
                    }
                }
            }
        }

        outcomes
    }

    /// Apply step run inside the target conversation's queue
    async fn apply_pending(
        &self,
        pending_id: PendingId,
        resolved: ResolvedTarget,
        generated: Message,
    ) -> ApplyOutcome {
        let Some(PendingReaction { record, .. }) = self.ctx.buffer().remove(pending_id) else {
            debug!(pending_id = %pending_id, "Reaction already claimed");
            return ApplyOutcome::AlreadyClaimed;
        };

        match self.apply_resolved(&record, resolved, generated).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log_apply_failure(&e);
                ApplyOutcome::Failed
            }
        }
    }

    async fn apply_resolved(
        &self,
        record: &ReactionRecord,
        resolved: ResolvedTarget,
        generated: Message,
    ) -> RepoResult<ApplyOutcome> {
        // Matching happened outside the queue; only the stored copy is current
        let mut target = self.refetch(resolved.target.message()).await?;

        match resolved.target {
            ReactionTarget::Story(_) => {
                self.reply_to_story(&target, record, generated, resolved.conversation.id)
                    .await
            }
            ReactionTarget::Ordinary(_) => {
                let change = target.apply_reaction(record);
                if change.is_modified() {
                    self.ctx.messages().save(&target, SaveOptions::default()).await?;
                }
                debug!(message_id = %target.id, change = ?change, "Reaction applied");
                Ok(ApplyOutcome::Attached(change))
            }
        }
    }

    /// Current stored copy of a message
    async fn refetch(&self, message: &Message) -> RepoResult<Message> {
        self.ctx
            .messages()
            .find_by_sent_at(message.sent_at)
            .await?
            .into_iter()
            .find(|m| m.id == message.id)
            .ok_or(DomainError::MessageNotFound(message.id))
    }

    /// Persist `reply` as a reaction to `story` and link it into the
    /// conversation
    async fn reply_to_story(
        &self,
        story: &Message,
        record: &ReactionRecord,
        mut reply: Message,
        conversation_id: Snowflake,
    ) -> RepoResult<ApplyOutcome> {
        // Nothing to take back: story reactions never edit the story
        if record.remove {
            debug!(story_id = %story.id, "Ignoring story reaction removal");
            return Ok(ApplyOutcome::Attached(ReactionChange::Ignored));
        }

        reply.conversation_id = conversation_id;
        reply.attach_story_reaction(story, record);

        let id = self.ctx.messages().save(&reply, SaveOptions::force()).await?;
        self.ctx.conversations().link_message(conversation_id, id).await?;

        info!(
            story_id = %story.id,
            message_id = %id,
            conversation_id = %conversation_id,
            "Story reaction stored"
        );
        Ok(ApplyOutcome::StoryReply(id))
    }

    /// Conversation a claimed story reaction goes to, chosen the same way
    /// `on_reaction` chooses it
    async fn story_target_conversation(&self, record: &ReactionRecord, story: &Message) -> RepoResult<Snowflake> {
        TargetResolver::new(&self.ctx)
            .target_conversation(record, story, story.author_id)
            .await?
            .map(|c| c.id)
            .ok_or(DomainError::ConversationNotFound(story.conversation_id))
    }
}

fn log_apply_failure(e: &DomainError) {
    if e.is_not_found() {
        warn!(error = %e, code = e.code(), "Reaction target vanished before apply");
    } else {
        error!(error = %e, code = e.code(), "Failed to apply reaction");
    }
}
