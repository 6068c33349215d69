//! Repository implementations
//!
//! In-memory implementations of the collaborator traits defined in
//! reaction-core.

mod directory;
mod message;

pub use directory::InMemoryDirectory;
pub use message::InMemoryMessageStore;
