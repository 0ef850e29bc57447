//! Application layer containing the availability cache and its collaborators.
//!
//! `AvailabilityCache` is the single owner of the availability store. It fans
//! probe calls out over a bounded `WorkerPool` and is refreshed on a cadence by
//! the `RefreshScheduler`.

pub mod cache;
pub mod pool;
pub mod scheduler;
