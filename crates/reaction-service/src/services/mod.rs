//! Reaction reconciliation services
//!
//! The buffer holds reactions whose target is not known yet, the resolver
//! finds targets, and the engine ties both entry points (reaction arrival
//! and message arrival) to the per-conversation queue.

pub mod context;
pub mod engine;
pub mod error;
pub mod pending;
pub mod queue;
pub mod resolver;

pub use context::{ReactionContext, ReactionContextBuilder};
pub use engine::{ApplyOutcome, ReactionOutcome, ReconciliationEngine};
pub use error::{ServiceError, ServiceResult};
pub use pending::{PendingId, PendingReaction, PendingReactionBuffer};
pub use queue::SerialTaskQueue;
pub use resolver::{DropReason, ReactionTarget, Resolution, ResolvedTarget, TargetResolver};
