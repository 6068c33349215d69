//! Collaborator traits (ports)

mod queue;
mod repositories;

pub use queue::{ConversationQueue, JobCompletion, QueueJob};
pub use repositories::{
    ConversationDirectory, IdentityDirectory, MessageStore, RepoResult, SaveOptions,
};
