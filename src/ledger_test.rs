use std::sync::Arc;

use super::*;
use crate::backend::memory::{MemoryClient, Op};
use crate::backend::{Blob, DataClient, Session};
use crate::state::test_helpers::{row, test_app_state};
use crate::toast::Severity;

fn seed_balance(client: &MemoryClient, balance: i64) {
    client.seed("drink_dollars", vec![row(json!({"id": 1, "user_id": "u-1", "balance": balance}))]);
}

fn adjustment(action: LedgerAction, amount: i64) -> LedgerAdjustment {
    LedgerAdjustment { user_id: "u-1".into(), action, amount, note: Some("birthday".into()) }
}

fn balance(client: &MemoryClient) -> Value {
    client.rows("drink_dollars")[0]["balance"].clone()
}

#[tokio::test]
async fn credit_records_one_transaction_and_raises_balance() {
    let (state, client) = test_app_state();
    seed_balance(&client, 100);

    let receipt = adjust(&state, &adjustment(LedgerAction::Credit, 25)).await.unwrap();
    assert_eq!(receipt.balance_before, 100);
    assert_eq!(receipt.balance_after, 125);
    assert_eq!(balance(&client), json!(125));

    let txns = client.rows("drink_dollar_transactions");
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0]["coins"], json!(25));
    assert_eq!(txns[0]["action"], json!("credit"));
    assert_eq!(txns[0]["balance_after"], json!(125));
    assert_eq!(txns[0]["note"], json!("birthday"));
    assert_eq!(state.toasts.current().map(|t| t.severity), Some(Severity::Success));
}

#[tokio::test]
async fn debit_lowers_balance() {
    let (state, client) = test_app_state();
    seed_balance(&client, 40);
    let receipt = adjust(&state, &adjustment(LedgerAction::Debit, 40)).await.unwrap();
    assert_eq!(receipt.balance_after, 0);
    assert_eq!(balance(&client), json!(0));
}

#[tokio::test]
async fn overdraw_is_rejected_before_any_write() {
    let (state, client) = test_app_state();
    seed_balance(&client, 10);
    client.clear_calls();

    let err = adjust(&state, &adjustment(LedgerAction::Debit, 11)).await.unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { amount: 11, balance: 10 }));
    assert!(client.calls_of(Op::Insert).is_empty());
    assert!(client.calls_of(Op::Update).is_empty());
    assert_eq!(state.toasts.current().map(|t| t.severity), Some(Severity::Error));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected_without_network() {
    let (state, client) = test_app_state();
    seed_balance(&client, 10);
    for amount in [0, -5] {
        let err = adjust(&state, &adjustment(LedgerAction::Credit, amount)).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));
    }
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn missing_balance_row_is_reported() {
    let (state, _client) = test_app_state();
    let err = adjust(&state, &adjustment(LedgerAction::Credit, 5)).await.unwrap_err();
    assert!(matches!(err, LedgerError::NoBalanceRecord(ref u) if u == "u-1"));
    assert_eq!(err.error_code(), "E_LEDGER_NO_BALANCE");
}

#[tokio::test]
async fn failed_balance_write_removes_transaction() {
    let (state, client) = test_app_state();
    seed_balance(&client, 100);
    client.fail_next(Op::Update, BackendError::Response { status: 500, body: String::new() });

    let err = adjust(&state, &adjustment(LedgerAction::Credit, 25)).await.unwrap_err();
    assert!(matches!(err, LedgerError::Backend(_)));
    assert!(client.rows("drink_dollar_transactions").is_empty());
    assert_eq!(balance(&client), json!(100));

    let deletes = client.calls_of(Op::Delete);
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].target, "drink_dollar_transactions");
}

#[tokio::test]
async fn failed_rollback_reports_inconsistent_ledger() {
    let (state, client) = test_app_state();
    seed_balance(&client, 100);
    client.fail_next(Op::Update, BackendError::Request("offline".into()));
    client.fail_next(Op::Delete, BackendError::Request("offline".into()));

    let err = adjust(&state, &adjustment(LedgerAction::Credit, 25)).await.unwrap_err();
    let LedgerError::Inconsistent { transaction_id, .. } = &err else {
        panic!("expected Inconsistent, got {err:?}");
    };
    let txns = client.rows("drink_dollar_transactions");
    assert_eq!(txns.len(), 1);
    assert_eq!(Record::from_row(txns[0].clone()).unwrap().id, *transaction_id);
    assert_eq!(err.error_code(), "E_LEDGER_INCONSISTENT");
}

#[test]
fn action_names_match_stored_values() {
    assert_eq!(LedgerAction::Credit.to_string(), "credit");
    assert_eq!(LedgerAction::Debit.as_str(), "debit");
}

/// Delegates to a `MemoryClient` but strips ids from inserted rows.
struct IdlessInserts(Arc<MemoryClient>);

#[async_trait::async_trait]
impl DataClient for IdlessInserts {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, BackendError> {
        self.0.select(table, query).await
    }
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, BackendError> {
        self.0.count(table, filters).await
    }
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, BackendError> {
        let mut stored = self.0.insert(table, rows).await?;
        for row in &mut stored {
            row.remove("id");
        }
        Ok(stored)
    }
    async fn update(&self, table: &str, patch: Row, filters: &[Filter]) -> Result<Vec<Row>, BackendError> {
        self.0.update(table, patch, filters).await
    }
    async fn upsert(&self, table: &str, rows: Vec<Row>, on_conflict: &str) -> Result<Vec<Row>, BackendError> {
        self.0.upsert(table, rows, on_conflict).await
    }
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<(), BackendError> {
        self.0.delete(table, filters).await
    }
    async fn upload(&self, bucket: &str, path: &str, blob: Blob) -> Result<String, BackendError> {
        self.0.upload(bucket, path, blob).await
    }
    async fn remove_object(&self, bucket: &str, path: &str) -> Result<(), BackendError> {
        self.0.remove_object(bucket, path).await
    }
    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.0.public_url(bucket, path)
    }
    async fn session(&self) -> Result<Session, BackendError> {
        self.0.session().await
    }
}

#[tokio::test]
async fn insert_without_id_is_reported_inconsistent() {
    let memory = Arc::new(MemoryClient::new());
    seed_balance(&memory, 100);
    let state = AppState::with_client(Arc::new(IdlessInserts(memory.clone())));

    let err = adjust(&state, &adjustment(LedgerAction::Credit, 25)).await.unwrap_err();
    assert!(matches!(err, LedgerError::UntrackedTransaction { ref user_id } if user_id == "u-1"));
    assert_eq!(err.error_code(), "E_LEDGER_INCONSISTENT");
    assert!(memory.calls_of(Op::Update).is_empty());
    assert_eq!(balance(&memory), json!(100));
}
