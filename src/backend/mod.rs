//! Remote data client — the table, storage, and auth capability every view
//! talks to.
//!
//! DESIGN
//! ======
//! Views never reach for a global client. They receive an
//! `Arc<dyn DataClient>` through `AppState`, so tests swap in
//! [`memory::MemoryClient`] while the binary uses [`rest::RestClient`].
//!
//! Rows travel as untyped JSON maps; typing lives in the resource catalog,
//! not in the transport.

pub mod memory;
pub mod rest;

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// One backend row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// ERROR
// =============================================================================

/// Stable machine-readable code for log lines and CLI output.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

/// Errors produced by a [`DataClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Response { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// No authenticated session is available.
    #[error("not authenticated")]
    Unauthenticated,
}

impl ErrorCode for BackendError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_BACKEND_REQUEST",
            Self::Response { .. } => "E_BACKEND_RESPONSE",
            Self::Parse(_) => "E_BACKEND_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Unauthenticated => "E_UNAUTHENTICATED",
        }
    }
}

// =============================================================================
// QUERY
// =============================================================================

/// Equality filter on one column. Values are compared in their text form,
/// which is how the REST backend receives them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    #[must_use]
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self { column: column.into(), value: value.into() }
    }

    /// Whether `row` satisfies this filter.
    #[must_use]
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|v| value_text(v) == self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: SortDirection,
}

/// Inclusive row window `[from, to]`, matching the backend's range header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: u64,
    pub to: u64,
}

/// A `select` request: filters, optional ordering, optional window.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub range: Option<RowRange>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some(Order { column: column.into(), direction });
        self
    }

    #[must_use]
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.range = Some(RowRange { from, to });
        self
    }
}

// =============================================================================
// STORAGE + AUTH
// =============================================================================

/// A file headed for blob storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// The signed-in user as reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    /// Role claim issued by the server (`app_metadata.role`).
    pub role: Option<String>,
}

// =============================================================================
// CLIENT TRAIT
// =============================================================================

/// Table-scoped CRUD, blob storage, and session lookup.
#[async_trait::async_trait]
pub trait DataClient: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, BackendError>;

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError>;

    /// Insert rows and return them as stored (with server-assigned ids).
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError>;

    /// Apply `patch` to every row matching `filters`; returns updated rows.
    async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError>;

    /// Insert or replace rows whose `on_conflict` column already exists.
    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<Vec<Row>, BackendError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError>;

    /// Store `blob` at `bucket/path`; returns the stored path.
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<String, BackendError>;

    async fn remove_object(&self, bucket: &str, path: &str) -> Result<(), BackendError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;

    async fn session(&self) -> Result<Session, BackendError>;
}

/// Text form of a JSON value as used in filters and search.
#[must_use]
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
