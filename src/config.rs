//! Cache and pool tuning.

use crate::error::{AvailabilityError, Result};
use std::time::Duration;

/// Default lifetime of a refresh before reads consider the cache stale.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default wait for in-flight probes at shutdown, per drain phase.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Tuning for an `AvailabilityCache` and the worker pool behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a completed refresh keeps the cache fresh.
    pub ttl: Duration,
    /// Probes allowed to run at the same time.
    pub max_workers: usize,
    /// Probes admitted while every worker is busy. Anything beyond is rejected.
    pub queue_capacity: usize,
    pub shutdown_grace: Duration,
    /// Upper bound on a single probe call; `None` leaves the probe unbounded.
    pub probe_timeout: Option<Duration>,
}

impl CacheConfig {
    /// Sizes the pool for a catalog of `catalog_size` methods: three workers
    /// per method and room to queue one full refresh.
    pub fn for_catalog(catalog_size: usize) -> Self {
        let catalog_size = catalog_size.max(1);
        Self {
            ttl: DEFAULT_TTL,
            max_workers: 3 * catalog_size,
            queue_capacity: catalog_size,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            probe_timeout: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_pool_size(mut self, max_workers: usize, queue_capacity: usize) -> Self {
        self.max_workers = max_workers;
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Total outstanding units the pool admits before rejecting submissions.
    pub fn pool_capacity(&self) -> usize {
        self.max_workers + self.queue_capacity
    }

    pub fn validate(&self) -> Result<()> {
        let mut issues: Vec<String> = Vec::new();

        if self.ttl.is_zero() {
            issues.push("ttl must be > 0".into());
        }
        if self.max_workers == 0 {
            issues.push("max_workers must be > 0".into());
        }
        if self.probe_timeout.is_some_and(|timeout| timeout.is_zero()) {
            issues.push("probe_timeout must be > 0 when set".into());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(AvailabilityError::Config(issues.join("; ")))
        }
    }
}
