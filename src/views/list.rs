//! List view — one page of a resource's records with search, sort, paging,
//! and row actions.
//!
//! DESIGN
//! ======
//! The row set is a client-owned projection of the server table, replaced
//! wholesale on every fetch. Search filters the fetched page only; sorting
//! and paging re-query.
//!
//! Delete is provisional: the row leaves the projection before the request
//! goes out and comes back at its old index if the request fails.
//!
//! ERROR HANDLING
//! ==============
//! Fetch and delete failures show a toast and leave rows, page, and sort as
//! they were before the call.

use tracing::{info, warn};

use crate::backend::{BackendError, Order, Query, RowRange, SortDirection};
use crate::record::{Record, RecordId};
use crate::resource::Resource;
use crate::routes::AdminRoute;
use crate::state::AppState;

#[cfg(test)]
#[path = "list_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("no delete awaiting confirmation")]
    NoPendingDelete,
    #[error("row {0} is not on this page")]
    RowNotFound(RecordId),
    #[error("cannot sort by unknown column {0}")]
    UnknownColumn(String),
    #[error("{0} cannot be changed from the admin console")]
    NotWritable(&'static str),
}

/// Row-level navigation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowAction {
    View,
    Edit,
}

/// A row removed from the projection while its delete is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    index: usize,
    record: Record,
}

impl PendingDelete {
    #[must_use]
    pub fn id(&self) -> &RecordId {
        &self.record.id
    }
}

/// Inclusive row window for 1-based `page` of size `limit`:
/// `[(page-1)*limit, page*limit - 1]`.
#[must_use]
pub fn page_window(page: u64, limit: u64) -> RowRange {
    let page = page.max(1);
    let limit = limit.max(1);
    let from = (page - 1) * limit;
    RowRange { from, to: from + limit - 1 }
}

/// `ceil(count / limit)`.
#[must_use]
pub fn total_pages(count: u64, limit: u64) -> u64 {
    count.div_ceil(limit.max(1))
}

pub struct ListView {
    state: AppState,
    resource: &'static Resource,
    rows: Vec<Record>,
    page: u64,
    total_count: u64,
    total_pages: u64,
    order: Order,
    search: String,
    loading: bool,
    confirm_target: Option<RecordId>,
}

impl ListView {
    #[must_use]
    pub fn new(state: AppState, resource: &'static Resource) -> Self {
        Self {
            state,
            resource,
            rows: Vec::new(),
            page: 1,
            total_count: 0,
            total_pages: 0,
            order: Order { column: resource.order_key.to_string(), direction: SortDirection::Ascending },
            search: String::new(),
            loading: false,
            confirm_target: None,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &'static Resource {
        self.resource
    }

    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total_pages
    }

    #[must_use]
    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    #[must_use]
    pub fn order(&self) -> &Order {
        &self.order
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    // =========================================================================
    // FETCH
    // =========================================================================

    /// Fetch the current page and the resource's total count.
    ///
    /// # Errors
    ///
    /// Returns the backend error after showing a toast; prior rows are kept.
    pub async fn fetch(&mut self) -> Result<(), ListError> {
        self.fetch_page(self.page, self.order.clone()).await
    }

    async fn fetch_page(&mut self, page: u64, order: Order) -> Result<(), ListError> {
        let table = self.resource.table;
        let window = page_window(page, self.state.page_size);
        let query = Query { filters: Vec::new(), order: Some(order.clone()), range: Some(window) };

        self.loading = true;
        let result = async {
            let rows = self.state.client.select(table, &query).await?;
            let count = self.state.client.count(table, &[]).await?;
            Ok::<_, BackendError>((rows, count))
        }
        .await;
        self.loading = false;

        let (rows, count) = match result {
            Ok(ok) => ok,
            Err(e) => {
                warn!(table, page, error = %e, "list fetch failed");
                self.state
                    .toasts
                    .error(format!("Failed to load {}", self.resource.title.to_lowercase()));
                return Err(e.into());
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match Record::from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => warn!(table, error = %e, "skipping row"),
            }
        }

        info!(table, page, rows = records.len(), count, "list page fetched");
        self.rows = records;
        self.page = page;
        self.order = order;
        self.total_count = count;
        self.total_pages = total_pages(count, self.state.page_size);
        Ok(())
    }

    // =========================================================================
    // PAGING + SORT + SEARCH
    // =========================================================================

    /// Move to `page` and fetch it. Returns `false` without fetching when
    /// `page` is outside `[1, total_pages]`.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures; the current page is unchanged.
    pub async fn handle_page_change(&mut self, page: u64) -> Result<bool, ListError> {
        if page < 1 || page > self.total_pages {
            return Ok(false);
        }
        self.fetch_page(page, self.order.clone()).await?;
        Ok(true)
    }

    /// # Errors
    ///
    /// Propagates fetch failures.
    pub async fn next_page(&mut self) -> Result<bool, ListError> {
        self.handle_page_change(self.page + 1).await
    }

    /// # Errors
    ///
    /// Propagates fetch failures.
    pub async fn prev_page(&mut self) -> Result<bool, ListError> {
        match self.page.checked_sub(1) {
            Some(page) => self.handle_page_change(page).await,
            None => Ok(false),
        }
    }

    /// Sort by `column`: flips direction on the active column, otherwise
    /// starts ascending. Re-fetches the current page.
    ///
    /// # Errors
    ///
    /// `UnknownColumn` for columns the resource does not have; fetch
    /// failures leave the previous ordering in place.
    pub async fn toggle_sort(&mut self, column: &str) -> Result<(), ListError> {
        let direction = if self.order.column == column {
            self.order.direction.flipped()
        } else {
            SortDirection::Ascending
        };
        self.sort_by(column, direction).await
    }

    /// Sort by `column` in an explicit direction and re-fetch the current page.
    ///
    /// # Errors
    ///
    /// Same as [`ListView::toggle_sort`].
    pub async fn sort_by(&mut self, column: &str, direction: SortDirection) -> Result<(), ListError> {
        if column != "id" && self.resource.field(column).is_none() {
            return Err(ListError::UnknownColumn(column.to_string()));
        }
        let order = Order { column: column.to_string(), direction };
        self.fetch_page(self.page, order).await
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Fetched rows whose display field contains the search term
    /// (case-insensitive). Only the current page is searched.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&Record> {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows
            .iter()
            .filter(|r| {
                r.text(self.resource.display_field)
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect()
    }

    // =========================================================================
    // ROW ACTIONS
    // =========================================================================

    #[must_use]
    pub fn row_route(&self, action: RowAction, id: &RecordId) -> AdminRoute {
        match action {
            RowAction::View => AdminRoute::View(self.resource, id.clone()),
            RowAction::Edit => AdminRoute::Edit(self.resource, id.clone()),
        }
    }

    #[must_use]
    pub fn create_route(&self) -> AdminRoute {
        AdminRoute::Create(self.resource)
    }

    /// Ask for confirmation before deleting `id`.
    ///
    /// # Errors
    ///
    /// `NotWritable` for resources that refuse generic deletes,
    /// `RowNotFound` if the row is not on the current page.
    pub fn request_delete(&mut self, id: &RecordId) -> Result<(), ListError> {
        self.ensure_writable()?;
        if !self.rows.iter().any(|r| &r.id == id) {
            return Err(ListError::RowNotFound(id.clone()));
        }
        self.confirm_target = Some(id.clone());
        Ok(())
    }

    #[must_use]
    pub fn awaiting_confirmation(&self) -> Option<&RecordId> {
        self.confirm_target.as_ref()
    }

    pub fn cancel_delete(&mut self) {
        self.confirm_target = None;
    }

    /// Delete the row awaiting confirmation.
    ///
    /// # Errors
    ///
    /// `NoPendingDelete` without a prior `request_delete`; backend errors
    /// after the row has been restored.
    pub async fn confirm_delete(&mut self) -> Result<(), ListError> {
        let id = self
            .confirm_target
            .take()
            .ok_or(ListError::NoPendingDelete)?;
        let pending = self.begin_delete(&id)?;
        self.commit_delete(pending).await
    }

    /// Remove `id` from the projection ahead of the server delete.
    ///
    /// # Errors
    ///
    /// `NotWritable` for resources that refuse generic deletes,
    /// `RowNotFound` if the row is not on the current page.
    pub fn begin_delete(&mut self, id: &RecordId) -> Result<PendingDelete, ListError> {
        self.ensure_writable()?;
        let index = self
            .rows
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| ListError::RowNotFound(id.clone()))?;
        let record = self.rows.remove(index);
        Ok(PendingDelete { index, record })
    }

    fn ensure_writable(&self) -> Result<(), ListError> {
        if self.resource.writable {
            Ok(())
        } else {
            Err(ListError::NotWritable(self.resource.slug))
        }
    }

    /// Issue the server delete for a provisional removal; confirm it on
    /// success, restore the row on failure.
    ///
    /// # Errors
    ///
    /// Returns the backend error after restoring the row and showing a toast.
    pub async fn commit_delete(&mut self, pending: PendingDelete) -> Result<(), ListError> {
        let table = self.resource.table;
        match self
            .state
            .client
            .delete(table, &[pending.record.id.filter()])
            .await
        {
            Ok(()) => {
                info!(table, id = %pending.record.id, "row deleted");
                self.total_count = self.total_count.saturating_sub(1);
                self.total_pages = total_pages(self.total_count, self.state.page_size);
                self.state.toasts.success("Deleted");

                let last = self.total_pages.max(1);
                if self.page > last {
                    // The current page emptied out; show the new last page.
                    self.page = last;
                    if let Err(e) = self.fetch_page(last, self.order.clone()).await {
                        warn!(table, page = last, error = %e, "refetch after delete failed");
                    }
                }
                Ok(())
            }
            Err(e) => {
                warn!(table, id = %pending.record.id, error = %e, "delete failed; restoring row");
                let index = pending.index.min(self.rows.len());
                self.rows.insert(index, pending.record);
                self.state.toasts.error("Delete failed");
                Err(e.into())
            }
        }
    }
}
