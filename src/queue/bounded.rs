use crate::queue::error::{QueueError, QueueResult};
use crate::queue::types::StopReport;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinHandle};

struct QueueState<T> {
    items: VecDeque<T>,
    stopped: bool,
}

/// FIFO queue with a fixed capacity and a pool of consumer tasks.
///
/// Producers never block: `produce` fails with [`QueueError::QueueFull`]
/// when the queue holds `capacity` items. Each item is handed to exactly one
/// consumer. Stopping the queue lets consumers drain what is left.
pub struct BoundedQueue<T> {
    // The stopped flag lives under the items lock so no item can be
    // accepted after consumers have seen the queue stopped and empty.
    state: Mutex<QueueState<T>>,
    capacity: usize,
    notify: Notify,
    consumers: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: Send + 'static> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity.min(1024)),
                stopped: false,
            }),
            capacity,
            notify: Notify::new(),
            consumers: Mutex::new(Vec::new()),
        }
    }

    /// Enqueue an item at the back of the queue.
    pub fn produce(&self, item: T) -> QueueResult<()> {
        {
            let mut state = self.state.lock();
            if state.stopped {
                return Err(QueueError::Stopped);
            }
            if state.items.len() >= self.capacity {
                return Err(QueueError::QueueFull(self.capacity));
            }
            state.items.push_back(item);
        }

        self.notify.notify_one();
        Ok(())
    }

    /// Wait for the next item. Returns `None` once the queue is stopped and empty.
    pub async fn consume(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent produce/stop cannot be missed
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(item) = state.items.pop_front() {
                    return Some(item);
                }
                if state.stopped {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Spawn `num_consumers` tasks that feed every item to `handler`.
    pub fn start_consumers<F, Fut>(self: &Arc<Self>, num_consumers: usize, handler: F) -> QueueResult<()>
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.state.lock().stopped {
            return Err(QueueError::Stopped);
        }

        let mut consumers = self.consumers.lock();
        if !consumers.is_empty() {
            return Err(QueueError::AlreadyStarted);
        }

        let handler = Arc::new(handler);
        for consumer_id in 0..num_consumers {
            let queue = Arc::clone(self);
            let handler = Arc::clone(&handler);
            consumers.push(tokio::spawn(async move {
                while let Some(item) = queue.consume().await {
                    handler(item).await;
                }
                tracing::debug!(consumer_id, "queue consumer stopped");
            }));
        }

        Ok(())
    }

    /// Stop accepting items and wait for consumers to drain the queue.
    ///
    /// With a grace period, consumers still running when it elapses are
    /// aborted; whatever they had not dequeued stays in the queue and can be
    /// collected with [`drain`](Self::drain).
    pub async fn stop(&self, grace: Option<Duration>) -> StopReport {
        self.state.lock().stopped = true;
        self.notify.notify_waiters();

        let handles = std::mem::take(&mut *self.consumers.lock());
        let deadline = grace.map(|g| tokio::time::Instant::now() + g);
        let mut report = StopReport::default();

        for mut handle in handles {
            let joined = match deadline {
                None => (&mut handle).await,
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        handle.abort();
                        report.aborted_consumers += 1;
                        continue;
                    }
                },
            };
            Self::record_exit(&mut report, joined);
        }

        report
    }

    fn record_exit(report: &mut StopReport, joined: Result<(), JoinError>) {
        match joined {
            Ok(()) => report.drained_consumers += 1,
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "queue consumer panicked");
                report.panicked_consumers += 1;
            }
            Err(_) => report.aborted_consumers += 1,
        }
    }

    /// Remove and return everything still queued.
    pub fn drain(&self) -> Vec<T> {
        self.state.lock().items.drain(..).collect()
    }

    pub fn size(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
