use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AvailabilityError>;

#[derive(Error, Debug)]
pub enum AvailabilityError {
    #[error("Probe error for payment method {method_id}: {reason}")]
    Probe { method_id: u32, reason: String },
    #[error("Probe for payment method {method_id} timed out after {timeout:?}")]
    ProbeTimeout { method_id: u32, timeout: Duration },
    #[error("Worker pool saturated: {capacity} units already outstanding")]
    PoolSaturated { capacity: usize },
    #[error("Worker pool is shutting down")]
    PoolShutdown,
    #[error("Store error: {0}")]
    Store(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AvailabilityError {
    /// Returns true when the error came from pool admission rather than the probe itself.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::PoolSaturated { .. } | Self::PoolShutdown)
    }
}
