//! Drink-dollar ledger adjustments.
//!
//! DESIGN
//! ======
//! A credit or debit is two writes: an immutable transaction row, then the
//! new balance on the user's `drink_dollars` row. The backend offers no
//! transaction across them, so a failed balance write deletes the
//! transaction row again. If that delete fails too, the orphaned
//! transaction id is reported as `Inconsistent` and logged at `error`.
//!
//! Debits that would take the balance below zero are rejected before any
//! write.

use std::fmt;

use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::backend::{BackendError, ErrorCode, Filter, Query, Row};
use crate::record::{Record, RecordId};
use crate::resource::{DRINK_DOLLAR_TRANSACTIONS, DRINK_DOLLARS};
use crate::state::AppState;

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("amount must be a positive whole number, got {0}")]
    InvalidAmount(i64),
    #[error("no drink-dollar balance for user {0}")]
    NoBalanceRecord(String),
    #[error("debit of {amount} exceeds balance of {balance}")]
    InsufficientBalance { amount: i64, balance: i64 },
    #[error("balance would overflow")]
    Overflow,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("ledger inconsistent: transaction {transaction_id} recorded but balance not updated ({source})")]
    Inconsistent { transaction_id: RecordId, source: BackendError },
    #[error("ledger inconsistent: transaction for {user_id} recorded without an id; balance not updated")]
    UntrackedTransaction { user_id: String },
}

impl ErrorCode for LedgerError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "E_LEDGER_INVALID_AMOUNT",
            Self::NoBalanceRecord(_) => "E_LEDGER_NO_BALANCE",
            Self::InsufficientBalance { .. } => "E_LEDGER_INSUFFICIENT",
            Self::Overflow => "E_LEDGER_OVERFLOW",
            Self::Backend(e) => e.error_code(),
            Self::Inconsistent { .. } | Self::UntrackedTransaction { .. } => "E_LEDGER_INCONSISTENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    Credit,
    Debit,
}

impl LedgerAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl fmt::Display for LedgerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAdjustment {
    pub user_id: String,
    pub action: LedgerAction,
    pub amount: i64,
    pub note: Option<String>,
}

/// Outcome of a committed adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReceipt {
    pub transaction_id: RecordId,
    pub balance_before: i64,
    pub balance_after: i64,
}

/// Apply a credit or debit to a user's balance.
///
/// # Errors
///
/// Validation errors (`InvalidAmount`, `NoBalanceRecord`,
/// `InsufficientBalance`) before any write, `Backend` when a write fails and
/// was rolled back, `Inconsistent` when the rollback itself failed, and
/// `UntrackedTransaction` when the inserted row came back without an id.
pub async fn adjust(state: &AppState, adjustment: &LedgerAdjustment) -> Result<LedgerReceipt, LedgerError> {
    let result = apply(state, adjustment).await;
    match &result {
        Ok(receipt) => {
            let verb = if adjustment.action == LedgerAction::Credit { "Credited" } else { "Debited" };
            state
                .toasts
                .success(format!("{verb} {} coins", adjustment.amount));
            info!(
                user_id = %adjustment.user_id,
                action = %adjustment.action,
                amount = adjustment.amount,
                balance = receipt.balance_after,
                "ledger adjusted"
            );
        }
        Err(e) => {
            state.toasts.error(e.to_string());
        }
    }
    result
}

async fn apply(state: &AppState, adjustment: &LedgerAdjustment) -> Result<LedgerReceipt, LedgerError> {
    let amount = adjustment.amount;
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }

    let by_user = Filter::eq("user_id", adjustment.user_id.clone());
    let balance = read_balance(state, &by_user, &adjustment.user_id).await?;
    let balance_after = match adjustment.action {
        LedgerAction::Credit => balance.checked_add(amount).ok_or(LedgerError::Overflow)?,
        LedgerAction::Debit if amount > balance => {
            return Err(LedgerError::InsufficientBalance { amount, balance });
        }
        LedgerAction::Debit => balance - amount,
    };

    let mut entry = Row::new();
    entry.insert("user_id".into(), Value::String(adjustment.user_id.clone()));
    entry.insert("action".into(), Value::String(adjustment.action.as_str().into()));
    entry.insert("coins".into(), json!(amount));
    entry.insert("balance_after".into(), json!(balance_after));
    entry.insert(
        "note".into(),
        adjustment
            .note
            .clone()
            .map_or(Value::Null, Value::String),
    );

    let inserted = state
        .client
        .insert(DRINK_DOLLAR_TRANSACTIONS.table, vec![entry])
        .await?;
    let Some(transaction_id) = inserted
        .into_iter()
        .next()
        .and_then(|r| Record::from_row(r).ok())
        .map(|r| r.id)
    else {
        // Nothing to roll back by; the row may exist without a balance change.
        error!(user_id = %adjustment.user_id, "ledger inconsistent: insert returned no transaction id");
        return Err(LedgerError::UntrackedTransaction { user_id: adjustment.user_id.clone() });
    };

    let mut patch = Row::new();
    patch.insert("balance".into(), json!(balance_after));
    let written = match state
        .client
        .update(DRINK_DOLLARS.table, patch, std::slice::from_ref(&by_user))
        .await
    {
        Ok(rows) if rows.is_empty() => Err(BackendError::Response { status: 404, body: "balance row vanished".into() }),
        Ok(_) => Ok(()),
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        return Err(roll_back(state, transaction_id, e).await);
    }

    Ok(LedgerReceipt { transaction_id, balance_before: balance, balance_after })
}

async fn read_balance(state: &AppState, by_user: &Filter, user_id: &str) -> Result<i64, LedgerError> {
    let rows = state
        .client
        .select(DRINK_DOLLARS.table, &Query::new().filter(by_user.clone()).range(0, 0))
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| LedgerError::NoBalanceRecord(user_id.to_string()))?;
    match row.get("balance") {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_i64()
            .ok_or_else(|| BackendError::Parse(format!("balance is not an integer: {v}")).into()),
    }
}

/// Delete the transaction row after a failed balance write.
async fn roll_back(state: &AppState, transaction_id: RecordId, source: BackendError) -> LedgerError {
    warn!(%transaction_id, error = %source, "balance write failed; removing transaction");
    match state
        .client
        .delete(DRINK_DOLLAR_TRANSACTIONS.table, &[transaction_id.filter()])
        .await
    {
        Ok(()) => LedgerError::Backend(source),
        Err(delete_err) => {
            error!(%transaction_id, error = %delete_err, "ledger inconsistent: orphaned transaction");
            LedgerError::Inconsistent { transaction_id, source }
        }
    }
}
