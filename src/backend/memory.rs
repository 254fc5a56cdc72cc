//! In-memory `DataClient` used by tests and offline demos.
//!
//! DESIGN
//! ======
//! Tables are plain `Vec<Row>` keyed by name. Every call is appended to a
//! log so tests can assert "exactly one insert" style properties, and a
//! one-shot failure can be armed per operation to exercise error paths.
//! Locks are `std::sync::Mutex` and are never held across an await.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{BackendError, Blob, DataClient, Filter, Query, Row, Session, SortDirection, value_text};

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

/// Operation kinds, for failure injection and call-log filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Count,
    Insert,
    Update,
    Upsert,
    Delete,
    Upload,
    RemoveObject,
    Session,
}

/// One recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Op,
    /// Table name, or bucket for storage calls.
    pub target: String,
    pub filters: Vec<Filter>,
    pub query: Option<Query>,
    pub rows: Vec<Row>,
}

#[derive(Default)]
struct Inner {
    tables: HashMap<String, Vec<Row>>,
    objects: HashMap<(String, String), Blob>,
    calls: Vec<Call>,
    failures: HashMap<Op, BackendError>,
    session: Option<Session>,
    next_id: u64,
}

#[derive(Default)]
pub struct MemoryClient {
    inner: Mutex<Inner>,
}

impl MemoryClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table's contents.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let mut inner = self.lock();
        for row in &rows {
            if let Some(n) = row.get("id").and_then(serde_json::Value::as_u64) {
                inner.next_id = inner.next_id.max(n);
            }
        }
        inner.tables.insert(table.to_string(), rows);
    }

    pub fn set_session(&self, session: Option<Session>) {
        self.lock().session = session;
    }

    /// Make the next call of kind `op` fail with `err`.
    pub fn fail_next(&self, op: Op, err: BackendError) {
        self.lock().failures.insert(op, err);
    }

    /// Snapshot of a table's rows.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Recorded calls of one kind.
    #[must_use]
    pub fn calls_of(&self, op: Op) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    #[must_use]
    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        self.lock()
            .objects
            .contains_key(&(bucket.to_string(), path.to_string()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Log the call and pop an armed failure for it, if any.
    fn record(&self, call: Call) -> Result<std::sync::MutexGuard<'_, Inner>, BackendError> {
        let mut inner = self.lock();
        let op = call.op;
        inner.calls.push(call);
        match inner.failures.remove(&op) {
            Some(err) => Err(err),
            None => Ok(inner),
        }
    }
}

fn call(op: Op, target: &str) -> Call {
    Call { op, target: target.to_string(), filters: Vec::new(), query: None, rows: Vec::new() }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(row))
}

fn compare_values(a: Option<&serde_json::Value>, b: Option<&serde_json::Value>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => value_text(a).cmp(&value_text(b)),
        },
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn assign_id(inner: &mut Inner, mut row: Row) -> Row {
    if !row.contains_key("id") {
        inner.next_id += 1;
        row.insert("id".into(), serde_json::Value::from(inner.next_id));
    }
    row
}

#[async_trait::async_trait]
impl DataClient for MemoryClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, BackendError> {
        let inner = self.record(Call { query: Some(query.clone()), filters: query.filters.clone(), ..call(Op::Select, table) })?;
        let mut rows: Vec<Row> = inner
            .tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches_all(r, &query.filters)).cloned().collect())
            .unwrap_or_default();
        drop(inner);

        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                match order.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        if let Some(range) = query.range {
            let from = usize::try_from(range.from).unwrap_or(usize::MAX);
            let to = usize::try_from(range.to).unwrap_or(usize::MAX);
            rows = rows
                .into_iter()
                .skip(from)
                .take(to.saturating_sub(from).saturating_add(1))
                .collect();
        }

        Ok(rows)
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        let inner = self.record(Call { filters: filters.to_vec(), ..call(Op::Count, table) })?;
        let n = inner
            .tables
            .get(table)
            .map_or(0, |rows| rows.iter().filter(|r| matches_all(r, filters)).count());
        Ok(n as u64)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        let mut inner = self.record(Call { rows: rows.clone(), ..call(Op::Insert, table) })?;
        let stored: Vec<Row> = rows.into_iter().map(|r| assign_id(&mut inner, r)).collect();
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError> {
        let mut inner =
            self.record(Call { filters: filters.to_vec(), rows: vec![patch.clone()], ..call(Op::Update, table) })?;
        let mut updated = Vec::new();
        if let Some(rows) = inner.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches_all(r, filters)) {
                for (k, v) in &patch {
                    row.insert(k.clone(), v.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<Vec<Row>, BackendError> {
        let mut inner = self.record(Call {
            rows: rows.clone(),
            filters: vec![Filter::eq("on_conflict", on_conflict)],
            ..call(Op::Upsert, table)
        })?;
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let key = row.get(on_conflict).map(value_text);
            let existing = inner.tables.get(table).and_then(|existing| {
                existing
                    .iter()
                    .position(|r| key.is_some() && r.get(on_conflict).map(value_text) == key)
            });
            match existing {
                Some(idx) => {
                    let table_rows = inner.tables.entry(table.to_string()).or_default();
                    let slot = &mut table_rows[idx];
                    for (k, v) in row {
                        slot.insert(k, v);
                    }
                    stored.push(slot.clone());
                }
                None => {
                    let row = assign_id(&mut inner, row);
                    inner
                        .tables
                        .entry(table.to_string())
                        .or_default()
                        .push(row.clone());
                    stored.push(row);
                }
            }
        }
        Ok(stored)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError> {
        let mut inner = self.record(Call { filters: filters.to_vec(), ..call(Op::Delete, table) })?;
        if let Some(rows) = inner.tables.get_mut(table) {
            rows.retain(|r| !matches_all(r, filters));
        }
        Ok(())
    }

    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<String, BackendError> {
        let mut inner = self.record(Call { filters: vec![Filter::eq("path", path)], ..call(Op::Upload, bucket) })?;
        inner
            .objects
            .insert((bucket.to_string(), path.to_string()), blob);
        Ok(path.to_string())
    }

    async fn remove_object(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        let mut inner =
            self.record(Call { filters: vec![Filter::eq("path", path)], ..call(Op::RemoveObject, bucket) })?;
        inner
            .objects
            .remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }

    async fn session(&self) -> Result<Session, BackendError> {
        let inner = self.record(call(Op::Session, "auth"))?;
        inner.session.clone().ok_or(BackendError::Unauthenticated)
    }
}
