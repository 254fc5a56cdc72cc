//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is handed to every view at construction. It carries the
//! injected data client, the shared toast slot, and list paging config.
//! Clone is cheap: the client and toast slot are Arc-wrapped.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::DataClient;
use crate::config::{AdminConfig, DEFAULT_PAGE_SIZE, DEFAULT_TOAST_MS};
use crate::toast::Toaster;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn DataClient>,
    pub toasts: Toaster,
    pub page_size: u64,
}

impl AppState {
    #[must_use]
    pub fn new(client: Arc<dyn DataClient>, config: &AdminConfig) -> Self {
        Self { client, toasts: Toaster::new(config.toast_duration), page_size: config.page_size.max(1) }
    }

    /// State with default paging and toast timing, for tests and demos.
    #[must_use]
    pub fn with_client(client: Arc<dyn DataClient>) -> Self {
        Self {
            client,
            toasts: Toaster::new(Duration::from_millis(DEFAULT_TOAST_MS)),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use serde_json::Value;

    use super::AppState;
    use crate::backend::Row;
    use crate::backend::memory::MemoryClient;

    /// Fresh app state over an empty in-memory backend.
    #[must_use]
    pub fn test_app_state() -> (AppState, Arc<MemoryClient>) {
        let client = Arc::new(MemoryClient::new());
        (AppState::with_client(client.clone()), client)
    }

    /// Build a row from a `json!` object literal.
    #[must_use]
    pub fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap_or_default()
    }

    /// Seed `n` rows named `{prefix} 1..=n` with sequential ids.
    pub fn seed_named(client: &MemoryClient, table: &str, field: &str, prefix: &str, n: u64) {
        let rows = (1..=n)
            .map(|i| row(serde_json::json!({ "id": i, field: format!("{prefix} {i}") })))
            .collect();
        client.seed(table, rows);
    }
}
