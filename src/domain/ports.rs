use super::availability::AvailabilityRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A remote availability check for a single payment method.
///
/// Latency and failure are nondeterministic; callers treat any error as
/// "unavailable" for that method.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    async fn query_availability(&self, method_id: u32) -> Result<bool>;
}

/// Slot map of the latest availability record per payment method identifier.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn put(&self, record: AvailabilityRecord) -> Result<()>;
    async fn snapshot(&self) -> Result<Vec<AvailabilityRecord>>;
}

pub type AvailabilityProbeRef = Arc<dyn AvailabilityProbe>;
pub type AvailabilityStoreRef = Arc<dyn AvailabilityStore>;
