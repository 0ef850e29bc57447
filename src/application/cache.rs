use crate::application::pool::{DrainOutcome, WorkerPool};
use crate::config::CacheConfig;
use crate::domain::availability::AvailabilityRecord;
use crate::domain::payment_method::PaymentMethod;
use crate::domain::ports::{AvailabilityProbe, AvailabilityProbeRef, AvailabilityStoreRef};
use crate::error::{AvailabilityError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Tracing target for cache operations.
const TRACING_TARGET: &str = "payment_availability::cache";

/// Completion time of the last refresh, as milliseconds since `origin` plus one.
///
/// Zero means "never refreshed", which is always stale. The stored value only
/// moves forward.
struct FreshnessMarker {
    origin: Instant,
    refreshed_at: AtomicU64,
}

impl FreshnessMarker {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            refreshed_at: AtomicU64::new(0),
        }
    }

    fn now(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64 + 1
    }

    fn mark(&self) {
        self.refreshed_at.fetch_max(self.now(), Ordering::AcqRel);
    }

    fn last(&self) -> Option<Instant> {
        match self.refreshed_at.load(Ordering::Acquire) {
            0 => None,
            at => Some(self.origin + Duration::from_millis(at - 1)),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        match self.refreshed_at.load(Ordering::Acquire) {
            0 => true,
            at => u128::from(self.now().saturating_sub(at)) > ttl.as_millis(),
        }
    }
}

/// Time-bounded cache of payment method availability.
///
/// Refreshes are serialized through a single gate: a scheduled refresh and a
/// read that found the cache stale never probe at the same time, and a burst of
/// stale reads results in one refresh. Each probe writes its own slot as soon
/// as it answers, so a read racing a refresh may see a mix of old and new
/// entries.
pub struct AvailabilityCache {
    catalog: Vec<PaymentMethod>,
    probe: AvailabilityProbeRef,
    store: AvailabilityStoreRef,
    pool: WorkerPool,
    refresh_gate: Mutex<()>,
    freshness: FreshnessMarker,
    ttl: Duration,
    probe_timeout: Option<Duration>,
    shutdown_grace: Duration,
}

impl AvailabilityCache {
    /// Builds the cache and its worker pool.
    ///
    /// The store starts out however the caller hands it over; the cache is
    /// considered stale until its first refresh completes.
    pub fn start(
        catalog: Vec<PaymentMethod>,
        config: CacheConfig,
        probe: AvailabilityProbeRef,
        store: AvailabilityStoreRef,
    ) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET,
            catalog_size = catalog.len(),
            ttl_secs = config.ttl.as_secs(),
            max_workers = config.max_workers,
            queue_capacity = config.queue_capacity,
            "Availability cache started"
        );

        Ok(Self {
            pool: WorkerPool::new(config.max_workers, config.queue_capacity),
            catalog,
            probe,
            store,
            refresh_gate: Mutex::new(()),
            freshness: FreshnessMarker::new(),
            ttl: config.ttl,
            probe_timeout: config.probe_timeout,
            shutdown_grace: config.shutdown_grace,
        })
    }

    pub fn catalog(&self) -> &[PaymentMethod] {
        &self.catalog
    }

    /// When the last refresh completed, if any has.
    pub fn last_refreshed(&self) -> Option<Instant> {
        self.freshness.last()
    }

    pub fn is_stale(&self) -> bool {
        self.freshness.is_stale(self.ttl)
    }

    /// Returns the current availability of every cached payment method.
    ///
    /// A stale or empty cache is refreshed over the full catalog before
    /// returning, unless another caller refreshed it while this one waited for
    /// the gate. Never fails: "no data" is an empty list.
    pub async fn read(&self) -> Vec<AvailabilityRecord> {
        let snapshot = self.snapshot().await;
        if !self.needs_refresh(&snapshot) {
            return snapshot;
        }

        let _gate = self.refresh_gate.lock().await;
        let snapshot = self.snapshot().await;
        if !self.needs_refresh(&snapshot) {
            return snapshot;
        }

        tracing::warn!(
            target: TRACING_TARGET,
            cached = snapshot.len(),
            "Cache is stale or empty, refreshing before read"
        );
        self.refresh_locked(&self.catalog).await;
        self.snapshot().await
    }

    /// Probes every method in `methods` in parallel and records the answers.
    ///
    /// Returns once every probe has finished. A probe that fails, panics, times
    /// out or cannot be admitted by the pool leaves its method unavailable;
    /// nothing is propagated to the caller.
    pub async fn refresh(&self, methods: &[PaymentMethod]) {
        let _gate = self.refresh_gate.lock().await;
        self.refresh_locked(methods).await;
    }

    /// Refreshes the full catalog.
    pub async fn refresh_all(&self) {
        self.refresh(&self.catalog).await;
    }

    /// Stops the worker pool, giving in-flight probes the configured grace period.
    pub async fn shutdown(&self) -> DrainOutcome {
        self.pool.shutdown(self.shutdown_grace).await
    }

    fn needs_refresh(&self, snapshot: &[AvailabilityRecord]) -> bool {
        snapshot.is_empty() || self.is_stale()
    }

    // Caller must hold `refresh_gate`.
    async fn refresh_locked(&self, methods: &[PaymentMethod]) {
        let started = Instant::now();
        let mut pending = Vec::with_capacity(methods.len());
        let mut degraded = 0usize;

        for method in methods {
            match self.dispatch(method) {
                Ok(handle) => pending.push((method, handle)),
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        method_id = method.id,
                        error = %err,
                        "Probe not admitted, marking method unavailable"
                    );
                    degraded += 1;
                    self.write(AvailabilityRecord::unavailable(method)).await;
                }
            }
        }

        for (method, handle) in pending {
            match handle.await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        method_id = method.id,
                        "Probe cancelled, marking method unavailable"
                    );
                    degraded += 1;
                    self.write(AvailabilityRecord::unavailable(method)).await;
                }
                Err(err) => {
                    tracing::error!(
                        target: TRACING_TARGET,
                        method_id = method.id,
                        error = %err,
                        "Probe task failed, marking method unavailable"
                    );
                    degraded += 1;
                    self.write(AvailabilityRecord::unavailable(method)).await;
                }
            }
        }

        self.freshness.mark();

        tracing::info!(
            target: TRACING_TARGET,
            methods = methods.len(),
            degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Availability refresh completed"
        );
    }

    /// Submits one probe unit. The unit writes its own record when it answers.
    fn dispatch(&self, method: &PaymentMethod) -> Result<JoinHandle<Option<bool>>> {
        let probe = self.probe.clone();
        let store = self.store.clone();
        let method = method.clone();
        let timeout = self.probe_timeout;

        self.pool.submit(async move {
            let available = match query(probe.as_ref(), method.id, timeout).await {
                Ok(available) => available,
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        method_id = method.id,
                        error = %err,
                        "Availability probe failed"
                    );
                    false
                }
            };

            if let Err(err) = store.put(AvailabilityRecord::new(&method, available)).await {
                tracing::error!(
                    target: TRACING_TARGET,
                    method_id = method.id,
                    error = %err,
                    "Failed to store availability"
                );
            }
            available
        })
    }

    async fn write(&self, record: AvailabilityRecord) {
        let method_id = record.id;
        if let Err(err) = self.store.put(record).await {
            tracing::error!(
                target: TRACING_TARGET,
                method_id,
                error = %err,
                "Failed to store availability"
            );
        }
    }

    async fn snapshot(&self) -> Vec<AvailabilityRecord> {
        match self.store.snapshot().await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    error = %err,
                    "Failed to read availability store"
                );
                Vec::new()
            }
        }
    }
}

async fn query(
    probe: &dyn AvailabilityProbe,
    method_id: u32,
    timeout: Option<Duration>,
) -> Result<bool> {
    match timeout {
        None => probe.query_availability(method_id).await,
        Some(timeout) => tokio::time::timeout(timeout, probe.query_availability(method_id))
            .await
            .map_err(|_| AvailabilityError::ProbeTimeout { method_id, timeout })?,
    }
}
