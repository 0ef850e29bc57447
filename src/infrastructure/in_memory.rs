use crate::domain::availability::AvailabilityRecord;
use crate::domain::ports::AvailabilityStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for availability records.
///
/// Uses `Arc<RwLock<HashMap<u32, AvailabilityRecord>>>` so any number of
/// readers can snapshot while refresh units write their own slots.
/// Writes are per-slot overwrites, so concurrent refresh units commute.
#[derive(Default, Clone)]
pub struct InMemoryAvailabilityStore {
    records: Arc<RwLock<HashMap<u32, AvailabilityRecord>>>,
}

impl InMemoryAvailabilityStore {
    /// Creates a new, empty in-memory availability store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-sized for `capacity` payment methods.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
        }
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn put(&self, record: AvailabilityRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<AvailabilityRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}
