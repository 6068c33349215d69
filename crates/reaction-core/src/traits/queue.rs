//! Per-conversation serialized task queue (port)

use futures::future::BoxFuture;

use super::repositories::RepoResult;
use crate::value_objects::Snowflake;

/// A unit of work scheduled on a conversation
pub type QueueJob = BoxFuture<'static, ()>;

/// Resolves once the job has run, or with `QueueClosed` if it never will
pub type JobCompletion = BoxFuture<'static, RepoResult<()>>;

/// Serializes all mutations of one conversation
///
/// Jobs for the same conversation run one at a time in FIFO order. Jobs for
/// different conversations are independent. The job is scheduled when
/// `enqueue` returns; dropping the completion does not cancel it.
pub trait ConversationQueue: Send + Sync {
    fn enqueue(&self, conversation_id: Snowflake, label: &'static str, job: QueueJob) -> JobCompletion;
}
