//! Serial task queue
//!
//! One worker task per conversation, fed by an unbounded channel. The
//! registry maps conversation ids to the sending half of each worker's
//! channel, so FIFO order is fixed the moment `enqueue` returns.

use dashmap::DashMap;
use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, trace, warn};

use reaction_core::traits::{ConversationQueue, JobCompletion, QueueJob};
use reaction_core::{DomainError, Snowflake};

/// A job waiting in a conversation's channel
struct QueuedJob {
    label: &'static str,
    job: QueueJob,
    done: oneshot::Sender<()>,
}

/// Default [`ConversationQueue`] backed by tokio tasks
///
/// Must be used from inside a tokio runtime. Idle workers stay registered
/// for the lifetime of the queue.
#[derive(Default)]
pub struct SerialTaskQueue {
    workers: DashMap<Snowflake, mpsc::UnboundedSender<QueuedJob>>,
}

impl SerialTaskQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: DashMap::new(),
        }
    }

    /// Number of conversations with a live worker
    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_closed()).count()
    }

    /// Sender for a conversation's worker, spawning one if none is running
    fn sender_for(
        &self,
        handle: &Handle,
        conversation_id: Snowflake,
    ) -> mpsc::UnboundedSender<QueuedJob> {
        let mut entry = self
            .workers
            .entry(conversation_id)
            .or_insert_with(|| spawn_worker(handle, conversation_id));

        if entry.is_closed() {
            warn!(conversation_id = %conversation_id, "Worker stopped, respawning");
            *entry = spawn_worker(handle, conversation_id);
        }

        entry.clone()
    }
}

impl ConversationQueue for SerialTaskQueue {
    fn enqueue(&self, conversation_id: Snowflake, label: &'static str, job: QueueJob) -> JobCompletion {
        let Ok(handle) = Handle::try_current() else {
            error!(
                conversation_id = %conversation_id,
                label,
                "No async runtime available, job not scheduled"
            );
            return closed(conversation_id);
        };

        let (done, completion) = oneshot::channel();
        let mut queued = QueuedJob { label, job, done };

        // A worker that died between lookup and send gets one replacement
        for _ in 0..2 {
            let sender = self.sender_for(&handle, conversation_id);
            match sender.send(queued) {
                Ok(()) => {
                    trace!(conversation_id = %conversation_id, label, "Job enqueued");
                    return async move {
                        completion
                            .await
                            .map_err(|_| DomainError::QueueClosed(conversation_id))
                    }
                    .boxed();
                }
                Err(mpsc::error::SendError(returned)) => queued = returned,
            }
        }

        error!(conversation_id = %conversation_id, label, "Worker unavailable, job dropped");
        closed(conversation_id)
    }
}

fn closed(conversation_id: Snowflake) -> JobCompletion {
    futures::future::ready(Err(DomainError::QueueClosed(conversation_id))).boxed()
}

fn spawn_worker(handle: &Handle, conversation_id: Snowflake) -> mpsc::UnboundedSender<QueuedJob> {
    let (tx, mut rx) = mpsc::unbounded_channel::<QueuedJob>();

    handle.spawn(async move {
        while let Some(QueuedJob { label, job, done }) = rx.recv().await {
            trace!(conversation_id = %conversation_id, label, "Running job");
            job.await;
            // Caller may have stopped waiting
            let _ = done.send(());
        }
    });

    trace!(conversation_id = %conversation_id, "Worker spawned");
    tx
}
