use crate::domain::ports::AvailabilityProbe;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

const TRACING_TARGET: &str = "payment_availability::remote";

/// Stand-in for the remote availability services.
///
/// Each call blocks for a random latency below `max_latency` and answers with
/// a coin flip, which is enough to exercise the cache's fan-out and staleness
/// behaviour end to end.
#[derive(Debug, Clone)]
pub struct SimulatedRemoteProbe {
    max_latency: Duration,
}

impl SimulatedRemoteProbe {
    pub fn new(max_latency: Duration) -> Self {
        Self { max_latency }
    }
}

impl Default for SimulatedRemoteProbe {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000))
    }
}

#[async_trait]
impl AvailabilityProbe for SimulatedRemoteProbe {
    async fn query_availability(&self, method_id: u32) -> Result<bool> {
        // ThreadRng is !Send, so draw everything before the first await.
        let (latency, available) = {
            let mut rng = rand::thread_rng();
            let max_ms = self.max_latency.as_millis() as u64;
            let latency = if max_ms == 0 {
                Duration::ZERO
            } else {
                Duration::from_millis(rng.gen_range(0..max_ms))
            };
            (latency, rng.gen_bool(0.5))
        };

        tokio::time::sleep(latency).await;

        tracing::trace!(
            target: TRACING_TARGET,
            method_id,
            latency_ms = latency.as_millis() as u64,
            available,
            "Remote availability answered"
        );
        Ok(available)
    }
}
