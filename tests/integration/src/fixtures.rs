//! Test fixtures and data generators
//!
//! Provides reusable identities and reaction records for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use reaction_core::{IdentityRef, ReactionRecord, Snowflake};

/// Counter for unique send timestamps
static CLOCK: AtomicI64 = AtomicI64::new(1_700_000_000_000);

/// A send timestamp no other test uses
pub fn unique_timestamp() -> i64 {
    CLOCK.fetch_add(1_000, Ordering::SeqCst)
}

/// Identity reference from a literal
pub fn identity(raw: &str) -> IdentityRef {
    IdentityRef::parse(raw).unwrap_or_else(|e| panic!("bad identity {raw:?}: {e}"))
}

/// A contact known to the harness: wire identity plus local id
#[derive(Debug, Clone)]
pub struct Contact {
    pub identity: IdentityRef,
    pub id: Snowflake,
}

/// Builder for reaction records
#[derive(Debug, Clone)]
pub struct ReactionBuilder {
    record: ReactionRecord,
}

impl ReactionBuilder {
    /// `sender` reacts with `emoji` to what `author` sent at `target_timestamp`
    pub fn new(emoji: &str, author: &IdentityRef, target_timestamp: i64, sender: &Contact) -> Self {
        Self {
            record: ReactionRecord::new(
                emoji,
                author.clone(),
                target_timestamp,
                target_timestamp + 500,
                sender.id,
                sender.id,
            ),
        }
    }

    /// When the reaction itself was sent
    pub fn at(mut self, timestamp: i64) -> Self {
        self.record.timestamp = timestamp;
        self
    }

    /// Conversation the carrying message arrived in
    pub fn via(mut self, conversation_id: Snowflake) -> Self {
        self.record.from_conversation_id = conversation_id;
        self
    }

    pub fn removal(mut self) -> Self {
        self.record.remove = true;
        self
    }

    pub fn build(self) -> ReactionRecord {
        self.record
    }
}
