//! HTTP read endpoint over the availability cache.

use crate::application::cache::AvailabilityCache;
use crate::domain::availability::AvailabilityRecord;
use crate::error::Result;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Tracing target for the read endpoint.
const TRACING_TARGET: &str = "payment_availability::http";

pub const AVAILABLE_ALL_PATH: &str = "/payment/available/all";

/// Response envelope of the read endpoint.
///
/// Degradation never shows up as an HTTP error: an empty list is reported
/// through `code`, unavailable methods through their own records.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub code: i32,
    pub available_services: Vec<AvailabilityRecord>,
}

impl QueryResponse {
    pub const CODE_OK: i32 = 0;
    pub const CODE_EMPTY: i32 = 1;

    pub fn from_records(records: Vec<AvailabilityRecord>) -> Self {
        let code = if records.is_empty() {
            Self::CODE_EMPTY
        } else {
            Self::CODE_OK
        };
        Self {
            code,
            available_services: records,
        }
    }
}

pub fn router(cache: Arc<AvailabilityCache>) -> Router {
    Router::new()
        .route(AVAILABLE_ALL_PATH, get(available_all))
        .with_state(cache)
}

/// `GET /payment/available/all`
pub async fn available_all(State(cache): State<Arc<AvailabilityCache>>) -> Json<QueryResponse> {
    let response = QueryResponse::from_records(cache.read().await);
    tracing::debug!(
        target: TRACING_TARGET,
        code = response.code,
        records = response.available_services.len(),
        "Served availability"
    );
    Json(response)
}

/// Serves the read endpoint on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, cache: Arc<AvailabilityCache>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(target: TRACING_TARGET, %addr, "Read endpoint listening");
    }
    axum::serve(listener, router(cache))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
