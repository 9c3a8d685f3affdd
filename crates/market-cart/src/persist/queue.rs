//! Single-writer queue for cart snapshots.
//!
//! Snapshots are enqueued in mutation order and written by one background
//! task, so the value left in storage is always the most recently issued
//! snapshot. When several snapshots are waiting, only the newest is written:
//! each write replaces the whole value, so older ones are already superseded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use market_kv::{Cache, KeyValueStore};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::cart::Cart;
use crate::config::RetryPolicy;
use crate::error::CartError;

type WriteResult = Result<(), CartError>;

enum WriteCommand {
    Write {
        snapshot: Cart,
        respond_to: oneshot::Sender<WriteResult>,
    },
    Flush {
        respond_to: oneshot::Sender<WriteResult>,
    },
}

/// Handle to the background writer.
pub(crate) struct WriteQueue {
    sender: mpsc::UnboundedSender<WriteCommand>,
}

/// Completion of one enqueued write.
pub(crate) struct PendingWrite {
    receiver: oneshot::Receiver<WriteResult>,
}

impl PendingWrite {
    /// Wait until the write (or a newer one replacing it) has been applied.
    pub(crate) async fn wait(self) -> WriteResult {
        self.receiver.await.map_err(|_| CartError::QueueClosed)?
    }
}

impl WriteQueue {
    /// Spawn the writer task on the current tokio runtime.
    ///
    /// The task exits once every `WriteQueue` handle has been dropped and the
    /// queue is drained.
    pub(crate) fn spawn(
        cache: Cache<Arc<dyn KeyValueStore>>,
        key: String,
        retry: RetryPolicy,
        dirty: Arc<AtomicBool>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let writer = Writer {
            cache,
            key,
            retry,
            dirty,
        };
        tokio::spawn(writer.run(receiver));
        Self { sender }
    }

    /// Enqueue a snapshot. Never blocks; callers hold the cart lock while
    /// enqueueing so queue order equals mutation order.
    pub(crate) fn enqueue(&self, snapshot: Cart) -> Result<PendingWrite, CartError> {
        let (respond_to, receiver) = oneshot::channel();
        self.sender
            .send(WriteCommand::Write {
                snapshot,
                respond_to,
            })
            .map_err(|_| CartError::QueueClosed)?;
        Ok(PendingWrite { receiver })
    }

    /// Resolve once every snapshot enqueued before this call is written.
    ///
    /// Returns the outcome of the last write applied before the flush point.
    pub(crate) async fn flush(&self) -> WriteResult {
        let (respond_to, receiver) = oneshot::channel();
        self.sender
            .send(WriteCommand::Flush { respond_to })
            .map_err(|_| CartError::QueueClosed)?;
        receiver.await.map_err(|_| CartError::QueueClosed)?
    }
}

struct Writer {
    cache: Cache<Arc<dyn KeyValueStore>>,
    key: String,
    retry: RetryPolicy,
    dirty: Arc<AtomicBool>,
}

impl Writer {
    async fn run(self, mut receiver: mpsc::UnboundedReceiver<WriteCommand>) {
        let mut last_result: WriteResult = Ok(());

        while let Some(first) = receiver.recv().await {
            // Drain whatever else is already queued; only the newest snapshot
            // needs to hit storage.
            let mut batch = vec![first];
            while let Ok(next) = receiver.try_recv() {
                batch.push(next);
            }

            let mut latest = None;
            let mut waiters = Vec::with_capacity(batch.len());
            for command in batch {
                match command {
                    WriteCommand::Write {
                        snapshot,
                        respond_to,
                    } => {
                        latest = Some(snapshot);
                        waiters.push(respond_to);
                    }
                    WriteCommand::Flush { respond_to } => waiters.push(respond_to),
                }
            }

            if let Some(snapshot) = latest {
                last_result = self.write(&snapshot).await;
            }

            for waiter in waiters {
                // A dropped receiver just means the caller stopped waiting.
                let _ = waiter.send(last_result.clone());
            }
        }

        debug!(key = %self.key, "cart write queue closed");
    }

    async fn write(&self, snapshot: &Cart) -> WriteResult {
        let mut attempt = 0;
        loop {
            match self.cache.set(&self.key, snapshot).await {
                Ok(()) => {
                    self.dirty.store(false, Ordering::SeqCst);
                    debug!(key = %self.key, items = snapshot.len(), "persisted cart snapshot");
                    return Ok(());
                }
                Err(e) if self.retry.should_retry(attempt) => {
                    let delay = self.retry.backoff.delay_for_attempt(attempt);
                    warn!(
                        key = %self.key,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "cart snapshot write failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    self.dirty.store(true, Ordering::SeqCst);
                    error!(
                        key = %self.key,
                        attempts = attempt + 1,
                        error = %e,
                        "giving up on cart snapshot write"
                    );
                    return Err(CartError::Persist {
                        attempts: attempt + 1,
                        source: Arc::new(e),
                    });
                }
            }
        }
    }
}
