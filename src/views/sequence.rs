//! Sequence editor — orders a category's questions and stores the order.
//!
//! DESIGN
//! ======
//! The selection is a plain ordered list. Every add, remove, or move
//! renumbers the whole list so positions are always `1..=N`. Saving is a
//! single upsert keyed by category that replaces the stored sequence; there
//! is no partial-order persistence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::{BackendError, Filter, Query, Row, SortDirection};
use crate::record::{Record, RecordId};
use crate::resource::{QUESTION_BANKS, Resource};
use crate::state::AppState;

#[cfg(test)]
#[path = "sequence_test.rs"]
mod tests;

pub const SEQUENCE_TABLE: &str = "question_sequences";
pub const SEQUENCE_KEY: &str = "category_id";

#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("item {0} is not in this category")]
    UnknownItem(RecordId),
    #[error("item {0} is already selected")]
    AlreadySelected(RecordId),
    #[error("item {0} is not selected")]
    NotSelected(RecordId),
    #[error("position {index} out of range (selection has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("stored sequence is malformed: {0}")]
    Malformed(String),
}

/// One selected item and its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceItem {
    pub item_id: RecordId,
    pub label: String,
    pub position: u32,
}

/// Wire form of one entry in the stored `items` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredEntry {
    question_id: String,
    position: u32,
}

pub struct SequenceEditor {
    state: AppState,
    source: &'static Resource,
    category_id: String,
    available: Vec<Record>,
    selected: Vec<SequenceItem>,
}

impl SequenceEditor {
    #[must_use]
    pub fn new(state: AppState, category_id: impl Into<String>) -> Self {
        Self {
            state,
            source: &QUESTION_BANKS,
            category_id: category_id.into(),
            available: Vec::new(),
            selected: Vec::new(),
        }
    }

    #[must_use]
    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    #[must_use]
    pub fn selected(&self) -> &[SequenceItem] {
        &self.selected
    }

    /// Category items not yet in the selection.
    #[must_use]
    pub fn unselected(&self) -> Vec<&Record> {
        self.available
            .iter()
            .filter(|r| !self.is_selected(&r.id))
            .collect()
    }

    fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.iter().any(|s| &s.item_id == id)
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    /// Fetch the category's items and its stored sequence. Stored entries
    /// whose item no longer exists are dropped and the rest renumbered.
    ///
    /// # Errors
    ///
    /// Backend errors (after a toast) and `Malformed` for an unreadable
    /// stored sequence. State is unchanged on error.
    pub async fn load(&mut self) -> Result<(), SequenceError> {
        let result = self.fetch().await;
        match result {
            Ok((available, stored)) => {
                self.available = available;
                self.selected = Vec::new();
                let stored_len = stored.len();
                for entry in stored {
                    let id = RecordId(entry.question_id);
                    if let Some(record) = self.available.iter().find(|r| r.id == id) {
                        let label = record.text(self.source.display_field);
                        self.selected.push(SequenceItem { item_id: id, label, position: 0 });
                    }
                }
                self.renumber();
                let dropped = stored_len - self.selected.len();
                if dropped > 0 {
                    info!(category_id = %self.category_id, dropped, "dropped stale sequence entries");
                    self.state
                        .toasts
                        .info(format!("{dropped} removed questions dropped from sequence"));
                }
                Ok(())
            }
            Err(e) => {
                warn!(category_id = %self.category_id, error = %e, "sequence load failed");
                self.state.toasts.error("Failed to load sequence");
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<(Vec<Record>, Vec<StoredEntry>), SequenceError> {
        let by_category = Filter::eq(SEQUENCE_KEY, self.category_id.clone());
        let rows = self
            .state
            .client
            .select(
                self.source.table,
                &Query::new()
                    .filter(by_category.clone())
                    .order_by("id", SortDirection::Ascending),
            )
            .await?;
        let available = rows
            .into_iter()
            .filter_map(|r| Record::from_row(r).ok())
            .collect();

        let stored_rows = self
            .state
            .client
            .select(SEQUENCE_TABLE, &Query::new().filter(by_category))
            .await?;
        let mut stored: Vec<StoredEntry> = match stored_rows.into_iter().next() {
            Some(row) => match row.get("items") {
                Some(items) => serde_json::from_value(items.clone()).map_err(|e| SequenceError::Malformed(e.to_string()))?,
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        stored.sort_by_key(|e| e.position);
        Ok((available, stored))
    }

    // =========================================================================
    // EDITING
    // =========================================================================

    /// Append a category item to the end of the selection.
    ///
    /// # Errors
    ///
    /// `UnknownItem` or `AlreadySelected`.
    pub fn add(&mut self, id: &RecordId) -> Result<(), SequenceError> {
        if self.is_selected(id) {
            return Err(SequenceError::AlreadySelected(id.clone()));
        }
        let record = self
            .available
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| SequenceError::UnknownItem(id.clone()))?;
        let label = record.text(self.source.display_field);
        self.selected
            .push(SequenceItem { item_id: id.clone(), label, position: 0 });
        self.renumber();
        Ok(())
    }

    /// # Errors
    ///
    /// `NotSelected` if `id` is not in the selection.
    pub fn remove(&mut self, id: &RecordId) -> Result<(), SequenceError> {
        let index = self
            .selected
            .iter()
            .position(|s| &s.item_id == id)
            .ok_or_else(|| SequenceError::NotSelected(id.clone()))?;
        self.selected.remove(index);
        self.renumber();
        Ok(())
    }

    /// Move the item at index `from` to index `to` (a drag-and-drop drop).
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` if either index is past the end.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), SequenceError> {
        let len = self.selected.len();
        for index in [from, to] {
            if index >= len {
                return Err(SequenceError::IndexOutOfRange { index, len });
            }
        }
        let item = self.selected.remove(from);
        self.selected.insert(to, item);
        self.renumber();
        Ok(())
    }

    fn renumber(&mut self) {
        for (position, item) in (1u32..).zip(self.selected.iter_mut()) {
            item.position = position;
        }
    }

    // =========================================================================
    // SAVE
    // =========================================================================

    /// Replace the stored sequence for this category with the current one.
    ///
    /// # Errors
    ///
    /// Backend errors, after a toast. Local state is kept for a retry.
    pub async fn save(&mut self) -> Result<(), SequenceError> {
        let entries: Vec<StoredEntry> = self
            .selected
            .iter()
            .map(|s| StoredEntry { question_id: s.item_id.0.clone(), position: s.position })
            .collect();
        let items = serde_json::to_value(&entries).map_err(|e| SequenceError::Malformed(e.to_string()))?;

        let mut row = Row::new();
        row.insert(SEQUENCE_KEY.into(), category_value(&self.category_id));
        row.insert("items".into(), items);

        match self
            .state
            .client
            .upsert(SEQUENCE_TABLE, vec![row], SEQUENCE_KEY)
            .await
        {
            Ok(_) => {
                info!(category_id = %self.category_id, items = entries.len(), "sequence saved");
                self.state.toasts.success("Sequence saved");
                Ok(())
            }
            Err(e) => {
                warn!(category_id = %self.category_id, error = %e, "sequence save failed");
                self.state.toasts.error("Failed to save sequence");
                Err(e.into())
            }
        }
    }
}

/// Numeric category ids are stored as numbers, anything else as text.
fn category_value(category_id: &str) -> Value {
    category_id
        .parse::<i64>()
        .map_or_else(|_| Value::String(category_id.to_string()), Value::from)
}
