//! Pending reaction buffer
//!
//! Reactions whose target message is not known yet wait here until the
//! message shows up or resolution gives up on them. Every operation takes
//! the same lock, so a record is handed out by exactly one `remove` or
//! `find_early_matches` call.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use reaction_core::{Message, ReactionRecord, Snowflake};

/// Handle for one buffered record; distinguishes duplicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PendingId(u64);

impl std::fmt::Display for PendingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// A record taken out of the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReaction {
    pub id: PendingId,
    pub record: ReactionRecord,
    /// Local identity of the target author, once resolved
    pub author_id: Option<Snowflake>,
}

#[derive(Debug)]
struct Entry {
    record: ReactionRecord,
    author_id: Option<Snowflake>,
}

impl Entry {
    /// Whether this entry is aimed at `message`
    ///
    /// Several wire identities can map to one local identity, so once the
    /// author is resolved only the local id is compared.
    fn targets(&self, message: &Message) -> bool {
        match self.author_id {
            Some(author_id) => {
                self.record.target_timestamp == message.sent_at && author_id == message.author_id
            }
            None => message
                .source
                .as_ref()
                .is_some_and(|source| self.record.targets(source, message.sent_at)),
        }
    }

    fn into_pending(self, id: PendingId) -> PendingReaction {
        PendingReaction {
            id,
            record: self.record,
            author_id: self.author_id,
        }
    }
}

/// Process-wide holding area for unmatched reactions
#[derive(Debug, Default)]
pub struct PendingReactionBuffer {
    next_id: AtomicU64,
    // Keyed by insertion order so claims come back oldest first
    entries: Mutex<BTreeMap<PendingId, Entry>>,
}

impl PendingReactionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a record; duplicates are kept side by side
    pub fn insert(&self, record: ReactionRecord) -> PendingId {
        let id = PendingId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().insert(
            id,
            Entry {
                record,
                author_id: None,
            },
        );
        id
    }

    /// Remember the resolved target author of a parked record
    ///
    /// Returns `false` when the record was already claimed.
    pub fn set_author(&self, id: PendingId, author_id: Snowflake) -> bool {
        match self.entries.lock().get_mut(&id) {
            Some(entry) => {
                entry.author_id = Some(author_id);
                true
            }
            None => false,
        }
    }

    /// Take one record out, if no one else has claimed it yet
    pub fn remove(&self, id: PendingId) -> Option<PendingReaction> {
        self.entries
            .lock()
            .remove(&id)
            .map(|entry| entry.into_pending(id))
    }

    /// Take a set of records out in one step
    ///
    /// Only the records still present are returned.
    pub fn remove_all(&self, ids: &[PendingId]) -> Vec<PendingReaction> {
        let mut entries = self.entries.lock();
        ids.iter()
            .filter_map(|id| entries.remove(id).map(|entry| entry.into_pending(*id)))
            .collect()
    }

    /// Claim every record that targets `message`
    ///
    /// For an outgoing message, records are matched on send time alone and,
    /// when any match, only those are returned. Otherwise a record must name
    /// the message's author and send time.
    pub fn find_early_matches(&self, message: &Message) -> Vec<PendingReaction> {
        let mut entries = self.entries.lock();

        if message.is_outgoing() {
            let claimed = drain_where(&mut entries, |entry| {
                entry.record.target_timestamp == message.sent_at
            });
            if !claimed.is_empty() {
                debug!(
                    message_id = %message.id,
                    claimed = claimed.len(),
                    "Claimed early reactions for outgoing message"
                );
                return claimed;
            }
        }

        let claimed = drain_where(&mut entries, |entry| entry.targets(message));
        if !claimed.is_empty() {
            debug!(
                message_id = %message.id,
                claimed = claimed.len(),
                "Claimed early reactions"
            );
        }
        claimed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of every buffered record, oldest first
    pub fn snapshot(&self) -> Vec<PendingReaction> {
        self.entries
            .lock()
            .iter()
            .map(|(id, entry)| PendingReaction {
                id: *id,
                record: entry.record.clone(),
                author_id: entry.author_id,
            })
            .collect()
    }
}

fn drain_where<F>(entries: &mut BTreeMap<PendingId, Entry>, matches: F) -> Vec<PendingReaction>
where
    F: Fn(&Entry) -> bool,
{
    let ids: Vec<PendingId> = entries
        .iter()
        .filter(|(_, entry)| matches(entry))
        .map(|(id, _)| *id)
        .collect();

    ids.into_iter()
        .filter_map(|id| entries.remove(&id).map(|entry| entry.into_pending(id)))
        .collect()
}
