//! Domain entities - core business objects

mod conversation;
mod message;
mod reaction;

pub use conversation::{Conversation, ConversationKind};
pub use message::{Message, MessageDirection, MessageKind};
pub use reaction::{MessageReaction, ReactionChange, ReactionRecord, StoryReaction};
