//! # reaction-service
//!
//! Application layer: the pending reaction buffer, target resolution, the
//! reconciliation engine, and a default per-conversation serial queue.

pub mod services;

pub use services::{
    ApplyOutcome, DropReason, PendingId, PendingReaction, PendingReactionBuffer, ReactionContext,
    ReactionContextBuilder, ReactionOutcome, ReactionTarget, ReconciliationEngine, Resolution,
    ResolvedTarget, SerialTaskQueue, ServiceError, ServiceResult, TargetResolver,
};
