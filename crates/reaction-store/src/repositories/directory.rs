//! In-memory implementation of IdentityDirectory and ConversationDirectory
//!
//! Every identity is backed by its direct conversation, so the identity id
//! and the direct conversation id are the same Snowflake.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tracing::{debug, instrument};

use reaction_core::entities::Conversation;
use reaction_core::error::DomainError;
use reaction_core::traits::{ConversationDirectory, IdentityDirectory, MessageStore, RepoResult};
use reaction_core::value_objects::{IdentityRef, Snowflake, SnowflakeGenerator};

use super::message::InMemoryMessageStore;

/// In-memory identity and conversation directory
pub struct InMemoryDirectory {
    messages: Arc<InMemoryMessageStore>,
    generator: Arc<SnowflakeGenerator>,
    identities: DashMap<IdentityRef, Snowflake>,
    conversations: DashMap<Snowflake, Conversation>,
    /// References this directory refuses to derive an identity for
    forbidden: DashSet<IdentityRef>,
    self_id: Snowflake,
}

impl InMemoryDirectory {
    /// Create a directory holding only the note-to-self conversation
    pub fn new(
        messages: Arc<InMemoryMessageStore>,
        generator: Arc<SnowflakeGenerator>,
        self_identity: IdentityRef,
    ) -> Self {
        let self_id = generator.generate();
        let identities = DashMap::new();
        let conversations = DashMap::new();

        identities.insert(self_identity.clone(), self_id);
        conversations.insert(self_id, Conversation::new_self(self_id, self_identity));

        Self {
            messages,
            generator,
            identities,
            conversations,
            forbidden: DashSet::new(),
            self_id,
        }
    }

    /// Identity id (and conversation id) of this client
    pub fn self_id(&self) -> Snowflake {
        self.self_id
    }

    /// Resolve an identity, creating its direct conversation on first sight
    ///
    /// Returns `None` for forbidden references.
    pub fn contact(&self, identity: &IdentityRef) -> Option<Snowflake> {
        if self.forbidden.contains(identity) {
            return None;
        }

        let id = *self
            .identities
            .entry(identity.clone())
            .or_insert_with(|| {
                let id = self.generator.generate();
                self.conversations
                    .insert(id, Conversation::new_direct(id, identity.clone()));
                debug!(identity = %identity, conversation_id = %id, "Placeholder identity created");
                id
            });

        Some(id)
    }

    /// Make a second wire identity resolve to an existing contact
    pub fn alias(&self, identity: IdentityRef, id: Snowflake) {
        self.identities.insert(identity, id);
    }

    /// Create an empty group conversation
    pub fn create_group(&self) -> Snowflake {
        let id = self.generator.generate();
        self.conversations.insert(id, Conversation::new_group(id));
        id
    }

    /// Never derive an identity for this reference
    pub fn forbid(&self, identity: IdentityRef) {
        self.forbidden.insert(identity);
    }

    /// Snapshot of a conversation
    pub fn conversation(&self, id: Snowflake) -> Option<Conversation> {
        self.conversations.get(&id).map(|c| c.clone())
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryDirectory {
    #[instrument(skip(self))]
    async fn lookup_or_create(&self, identity: &IdentityRef) -> RepoResult<Option<Snowflake>> {
        Ok(self.contact(identity))
    }
}

#[async_trait]
impl ConversationDirectory for InMemoryDirectory {
    #[instrument(skip(self))]
    async fn get(&self, id: Snowflake) -> RepoResult<Option<Conversation>> {
        Ok(self.conversation(id))
    }

    #[instrument(skip(self))]
    async fn find_for_target_message(
        &self,
        author_id: Snowflake,
        sent_at: i64,
    ) -> RepoResult<Option<Conversation>> {
        let candidates = self.messages.find_by_sent_at(sent_at).await?;

        Ok(candidates
            .iter()
            .find(|m| m.author_id == author_id)
            .and_then(|m| self.conversation(m.conversation_id)))
    }

    #[instrument(skip(self))]
    async fn link_message(&self, conversation_id: Snowflake, message_id: Snowflake) -> RepoResult<()> {
        let mut conversation = self
            .conversations
            .get_mut(&conversation_id)
            .ok_or(DomainError::ConversationNotFound(conversation_id))?;
        conversation.link_message(message_id);
        Ok(())
    }
}
