#![allow(dead_code)]

use async_trait::async_trait;
use payment_availability::application::cache::AvailabilityCache;
use payment_availability::config::CacheConfig;
use payment_availability::domain::payment_method::PaymentMethod;
use payment_availability::domain::ports::AvailabilityProbe;
use payment_availability::error::{AvailabilityError, Result};
use payment_availability::infrastructure::in_memory::InMemoryAvailabilityStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// What a scripted probe does for one payment method.
#[derive(Debug, Clone, Copy)]
pub enum Answer {
    Available(Duration),
    Unavailable(Duration),
    Fail(Duration),
    Panic,
}

/// Probe with a fixed answer per identifier and call accounting.
///
/// Identifiers without a script answer `available` immediately.
#[derive(Default)]
pub struct ScriptedProbe {
    answers: HashMap<u32, Answer>,
    calls: AtomicUsize,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, method_id: u32, answer: Answer) -> Self {
        self.answers.insert(method_id, answer);
        self
    }

    /// Every identifier in `ids` answers `available` after `delay`.
    pub fn all_after(ids: impl IntoIterator<Item = u32>, delay: Duration) -> Self {
        ids.into_iter().fold(Self::new(), |probe, id| {
            probe.answer(id, Answer::Available(delay))
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of probe calls observed running at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityProbe for ScriptedProbe {
    async fn query_availability(&self, method_id: u32) -> Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let answer = self
            .answers
            .get(&method_id)
            .copied()
            .unwrap_or(Answer::Available(Duration::ZERO));

        let result = match answer {
            Answer::Available(delay) => {
                tokio::time::sleep(delay).await;
                Ok(true)
            }
            Answer::Unavailable(delay) => {
                tokio::time::sleep(delay).await;
                Ok(false)
            }
            Answer::Fail(delay) => {
                tokio::time::sleep(delay).await;
                Err(AvailabilityError::Probe {
                    method_id,
                    reason: "remote service unreachable".to_string(),
                })
            }
            Answer::Panic => panic!("probe for {method_id} blew up"),
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

pub fn two_methods() -> Vec<PaymentMethod> {
    vec![PaymentMethod::new(1, "A"), PaymentMethod::new(2, "B")]
}

pub fn methods(count: u32) -> Vec<PaymentMethod> {
    (1..=count)
        .map(|id| PaymentMethod::new(id, format!("method-{id}")))
        .collect()
}

pub fn start_cache(
    catalog: Vec<PaymentMethod>,
    config: CacheConfig,
    probe: Arc<ScriptedProbe>,
) -> AvailabilityCache {
    AvailabilityCache::start(
        catalog,
        config,
        probe,
        Arc::new(InMemoryAvailabilityStore::new()),
    )
    .unwrap()
}
