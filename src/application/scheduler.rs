use crate::application::cache::AvailabilityCache;
use crate::error::{AvailabilityError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Tracing target for scheduled refreshes.
const TRACING_TARGET: &str = "payment_availability::scheduler";

/// Background task that refreshes the full catalog on a fixed cadence.
///
/// The first refresh fires immediately so the cache is warm before the first
/// read arrives.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl RefreshScheduler {
    pub fn spawn(cache: Arc<AvailabilityCache>, period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(AvailabilityError::Config(
                "refresh period must be > 0".into(),
            ));
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(run(cache, period, cancel_token.clone()));

        tracing::info!(
            target: TRACING_TARGET,
            period_secs = period.as_secs(),
            "Refresh scheduler started"
        );

        Ok(Self {
            handle,
            cancel_token,
        })
    }

    /// Stops the scheduler. A refresh in progress is abandoned; probes it
    /// already dispatched keep running until the pool is drained.
    pub async fn stop(self) {
        self.cancel_token.cancel();
        if let Err(err) = self.handle.await {
            tracing::error!(
                target: TRACING_TARGET,
                error = %err,
                "Refresh scheduler task failed"
            );
        }
        tracing::info!(target: TRACING_TARGET, "Refresh scheduler stopped");
    }
}

async fn run(cache: Arc<AvailabilityCache>, period: Duration, cancel_token: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            () = cancel_token.cancelled() => break,

            _ = interval.tick() => {}
        }

        tracing::info!(target: TRACING_TARGET, "Begin refreshing availability cache");

        tokio::select! {
            biased;

            () = cancel_token.cancelled() => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    "Shutdown requested during refresh, abandoning it"
                );
                break;
            }

            () = cache.refresh_all() => {
                tracing::info!(target: TRACING_TARGET, "End refreshing availability cache");
            }
        }
    }
}
