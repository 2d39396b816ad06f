//! Request Context
//!
//! Shared service state is built once; every request gets its own context
//! carrying a request id and the handles it may use.

use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::auth::TokenRegistry;
use crate::datasets::DatasetRegistry;
use crate::stream::TableStore;

/// Default maximum rows per response
pub const DEFAULT_ROW_CAP: usize = 3650;

/// Long-lived handles shared by all requests
#[derive(Clone)]
pub struct ServiceState {
    pub store: Arc<dyn TableStore>,
    pub datasets: Arc<DatasetRegistry>,
    pub tokens: Arc<TokenRegistry>,
    pub row_cap: usize,
}

impl ServiceState {
    pub fn new(
        store: Arc<dyn TableStore>,
        datasets: Arc<DatasetRegistry>,
        tokens: Arc<TokenRegistry>,
    ) -> Self {
        Self {
            store,
            datasets,
            tokens,
            row_cap: DEFAULT_ROW_CAP,
        }
    }

    pub fn with_row_cap(mut self, row_cap: usize) -> Self {
        self.row_cap = row_cap;
        self
    }
}

/// Context for one request; dropped when the response is written
pub struct RequestContext {
    /// Request ID for tracing
    pub request_id: Uuid,
    state: ServiceState,
    started_at: Instant,
}

impl RequestContext {
    pub fn new(state: &ServiceState) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            state: state.clone(),
            started_at: Instant::now(),
        }
    }

    pub fn store(&self) -> &dyn TableStore {
        self.state.store.as_ref()
    }

    pub fn datasets(&self) -> &DatasetRegistry {
        &self.state.datasets
    }

    pub fn tokens(&self) -> &TokenRegistry {
        &self.state.tokens
    }

    pub fn row_cap(&self) -> usize {
        self.state.row_cap
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}
