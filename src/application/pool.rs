use crate::error::{AvailabilityError, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Tracing target for worker pool operations.
const TRACING_TARGET: &str = "payment_availability::pool";

/// How a pool shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every unit finished within the grace period.
    Drained,
    /// Units outlived the grace period and were force-cancelled.
    Cancelled,
    /// Units were still running after cancellation and a second grace period.
    Abandoned,
}

/// Bounded pool of tokio tasks used for refresh fan-out.
///
/// At most `max_workers` units run at once and at most `queue_capacity` more
/// wait for a worker. Submissions beyond that are rejected immediately
/// instead of queueing without bound, as are submissions after shutdown.
pub struct WorkerPool {
    admission: Arc<Semaphore>,
    workers: Arc<Semaphore>,
    capacity: usize,
    tracker: TaskTracker,
    cancel_token: CancellationToken,
}

impl WorkerPool {
    pub fn new(max_workers: usize, queue_capacity: usize) -> Self {
        let capacity = max_workers + queue_capacity;

        tracing::debug!(
            target: TRACING_TARGET,
            max_workers,
            queue_capacity,
            "Worker pool created"
        );

        Self {
            admission: Arc::new(Semaphore::new(capacity)),
            workers: Arc::new(Semaphore::new(max_workers)),
            capacity,
            tracker: TaskTracker::new(),
            cancel_token: CancellationToken::new(),
        }
    }

    /// Submits a unit of work.
    ///
    /// The returned handle resolves to `None` when the unit was force-cancelled
    /// by [`shutdown`](Self::shutdown) before it finished.
    pub fn submit<F, T>(&self, unit: F) -> Result<JoinHandle<Option<T>>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let admitted = match self.admission.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(AvailabilityError::PoolShutdown),
            Err(TryAcquireError::NoPermits) => {
                return Err(AvailabilityError::PoolSaturated {
                    capacity: self.capacity,
                });
            }
        };

        let workers = self.workers.clone();
        let cancel_token = self.cancel_token.clone();

        Ok(self.tracker.spawn(async move {
            let _admitted = admitted;
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => None,

                output = async {
                    match workers.acquire_owned().await {
                        Ok(_worker) => Some(unit.await),
                        Err(_) => None,
                    }
                } => output,
            }
        }))
    }

    /// Units admitted and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.admission.is_closed()
    }

    /// Stops admitting work and drains what is in flight.
    ///
    /// Waits up to `grace` for in-flight units, then cancels the remainder and
    /// waits up to `grace` once more.
    pub async fn shutdown(&self, grace: Duration) -> DrainOutcome {
        self.admission.close();
        self.tracker.close();

        tracing::info!(
            target: TRACING_TARGET,
            in_flight = self.tracker.len(),
            grace_ms = grace.as_millis() as u64,
            "Worker pool shutting down"
        );

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            tracing::info!(target: TRACING_TARGET, "Worker pool drained");
            return DrainOutcome::Drained;
        }

        tracing::error!(
            target: TRACING_TARGET,
            remaining = self.tracker.len(),
            "Worker pool did not drain in time, cancelling remaining units"
        );
        self.cancel_token.cancel();

        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            DrainOutcome::Cancelled
        } else {
            tracing::error!(
                target: TRACING_TARGET,
                remaining = self.tracker.len(),
                "Worker pool failed to terminate"
            );
            DrainOutcome::Abandoned
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_submit_runs_unit() {
        let pool = WorkerPool::new(2, 0);
        let handle = pool.submit(async { 40 + 2 }).unwrap();
        assert_eq!(handle.await.unwrap(), Some(42));
    }

    #[tokio::test]
    async fn test_rejects_beyond_capacity() {
        let pool = WorkerPool::new(1, 1);
        let (release_tx, release_rx) = oneshot::channel::<()>();
        let (other_tx, other_rx) = oneshot::channel::<()>();

        let first = pool.submit(async move { release_rx.await.ok() }).unwrap();
        let second = pool.submit(async move { other_rx.await.ok() }).unwrap();

        let rejected = pool.submit(async {});
        assert!(matches!(
            rejected,
            Err(AvailabilityError::PoolSaturated { capacity: 2 })
        ));

        release_tx.send(()).unwrap();
        other_tx.send(()).unwrap();
        first.await.unwrap();
        second.await.unwrap();

        // Capacity is given back once units finish.
        assert!(pool.submit(async {}).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bounded_by_workers() {
        let pool = WorkerPool::new(2, 8);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.submit(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap()
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap(), Some(()));
        }
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejects_after_shutdown() {
        let pool = WorkerPool::new(1, 0);
        let outcome = pool.shutdown(Duration::from_millis(10)).await;
        assert_eq!(outcome, DrainOutcome::Drained);
        assert!(pool.is_shutdown());
        assert!(matches!(
            pool.submit(async {}),
            Err(AvailabilityError::PoolShutdown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_units() {
        let pool = WorkerPool::new(2, 0);
        let handle = pool
            .submit(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                "done"
            })
            .unwrap();

        let outcome = pool.shutdown(Duration::from_secs(1)).await;
        assert_eq!(outcome, DrainOutcome::Drained);
        assert_eq!(handle.await.unwrap(), Some("done"));
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_stuck_units() {
        let pool = WorkerPool::new(1, 0);
        let handle = pool.submit(std::future::pending::<()>()).unwrap();

        let outcome = pool.shutdown(Duration::from_millis(50)).await;
        assert_eq!(outcome, DrainOutcome::Cancelled);
        assert_eq!(handle.await.unwrap(), None);
    }
}
