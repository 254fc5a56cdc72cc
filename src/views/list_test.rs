use super::*;
use crate::backend::Filter;
use crate::backend::memory::{MemoryClient, Op};
use crate::resource::{DRINK_DOLLAR_TRANSACTIONS, EXPIRY_DATES};
use crate::state::test_helpers::{row, test_app_state};
use crate::toast::Severity;
use serde_json::json;

/// Seed `n` expiry-date rows: id `i`, label `Plan {i}`, days `i * 10`.
fn seed_plans(client: &MemoryClient, n: u64) {
    let rows = (1..=n)
        .map(|i| row(json!({"id": i, "label": format!("Plan {i}"), "days": i * 10})))
        .collect();
    client.seed("expiry_dates", rows);
}

fn labels(view: &ListView) -> Vec<String> {
    view.rows().iter().map(|r| r.text("label")).collect()
}

// =============================================================
// Paging math
// =============================================================

#[test]
fn page_window_is_half_open_range() {
    assert_eq!(page_window(1, 10), RowRange { from: 0, to: 9 });
    assert_eq!(page_window(3, 10), RowRange { from: 20, to: 29 });
    assert_eq!(page_window(2, 1), RowRange { from: 1, to: 1 });
}

#[test]
fn total_pages_rounds_up() {
    assert_eq!(total_pages(0, 10), 0);
    assert_eq!(total_pages(10, 10), 1);
    assert_eq!(total_pages(11, 10), 2);
    assert_eq!(total_pages(25, 10), 3);
}

// =============================================================
// Fetch + paging
// =============================================================

#[tokio::test]
async fn fetch_requests_window_for_page() {
    let (state, client) = test_app_state();
    seed_plans(&client, 25);
    let mut view = ListView::new(state, &EXPIRY_DATES);

    view.fetch().await.unwrap();
    assert_eq!(view.total_pages(), 3);
    assert_eq!(view.total_count(), 25);

    assert!(view.handle_page_change(3).await.unwrap());
    let selects = client.calls_of(Op::Select);
    let last = selects.last().unwrap().query.clone().unwrap();
    assert_eq!(last.range, Some(RowRange { from: 20, to: 29 }));
    assert_eq!(view.page(), 3);
    assert_eq!(labels(&view), vec!["Plan 21", "Plan 22", "Plan 23", "Plan 24", "Plan 25"]);
}

#[tokio::test]
async fn page_change_out_of_range_is_noop() {
    let (state, client) = test_app_state();
    seed_plans(&client, 25);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    client.clear_calls();

    assert!(!view.handle_page_change(0).await.unwrap());
    assert!(!view.handle_page_change(4).await.unwrap());
    assert!(!view.prev_page().await.unwrap());
    assert!(client.calls().is_empty());
    assert_eq!(view.page(), 1);
}

#[tokio::test]
async fn empty_table_has_no_pages() {
    let (state, _client) = test_app_state();
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    assert_eq!(view.total_pages(), 0);
    assert!(view.rows().is_empty());
    assert!(!view.next_page().await.unwrap());
}

#[tokio::test]
async fn fetch_failure_keeps_prior_rows_and_toasts() {
    let (state, client) = test_app_state();
    seed_plans(&client, 12);
    let toasts = state.toasts.clone();
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();

    client.fail_next(Op::Select, BackendError::Request("offline".into()));
    let err = view.handle_page_change(2).await.unwrap_err();
    assert!(matches!(err, ListError::Backend(_)));
    assert_eq!(view.page(), 1);
    assert_eq!(view.rows().len(), 10);
    assert!(!view.is_loading());
    assert_eq!(toasts.current().map(|t| t.severity), Some(Severity::Error));
}

// =============================================================
// Sort + search
// =============================================================

#[tokio::test]
async fn toggle_sort_flips_active_column() {
    let (state, client) = test_app_state();
    seed_plans(&client, 3);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    assert_eq!(view.order().column, "days");

    view.toggle_sort("days").await.unwrap();
    assert_eq!(view.order().direction, SortDirection::Descending);
    assert_eq!(labels(&view), vec!["Plan 3", "Plan 2", "Plan 1"]);

    view.toggle_sort("label").await.unwrap();
    assert_eq!(view.order().column, "label");
    assert_eq!(view.order().direction, SortDirection::Ascending);
}

#[tokio::test]
async fn sort_by_sets_direction_regardless_of_current_order() {
    let (state, client) = test_app_state();
    seed_plans(&client, 3);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    assert_eq!(view.order().column, "days");

    view.sort_by("days", SortDirection::Ascending).await.unwrap();
    assert_eq!(view.order().direction, SortDirection::Ascending);
    assert_eq!(labels(&view), vec!["Plan 1", "Plan 2", "Plan 3"]);

    view.sort_by("days", SortDirection::Descending).await.unwrap();
    view.sort_by("days", SortDirection::Descending).await.unwrap();
    assert_eq!(labels(&view), vec!["Plan 3", "Plan 2", "Plan 1"]);
    assert!(matches!(
        view.sort_by("nope", SortDirection::Descending).await,
        Err(ListError::UnknownColumn(_))
    ));
}

#[tokio::test]
async fn toggle_sort_rejects_unknown_column() {
    let (state, _client) = test_app_state();
    let mut view = ListView::new(state, &EXPIRY_DATES);
    assert!(matches!(view.toggle_sort("nope").await, Err(ListError::UnknownColumn(_))));
}

#[tokio::test]
async fn search_only_filters_fetched_page() {
    let (state, client) = test_app_state();
    seed_plans(&client, 25);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();

    view.set_search("plan 2");
    let visible: Vec<_> = view.visible_rows().iter().map(|r| r.text("label")).collect();
    // "Plan 20".."Plan 25" live on later pages and are not searched.
    assert_eq!(visible, vec!["Plan 2"]);

    view.set_search("  ");
    assert_eq!(view.visible_rows().len(), 10);
}

// =============================================================
// Row actions + delete
// =============================================================

#[tokio::test]
async fn row_routes_point_at_detail_views() {
    let (state, _client) = test_app_state();
    let view = ListView::new(state, &EXPIRY_DATES);
    let id = RecordId::from("4");
    assert_eq!(view.row_route(RowAction::Edit, &id).to_string(), "/admin/expiry-dates/edit/4");
    assert_eq!(view.row_route(RowAction::View, &id).to_string(), "/admin/expiry-dates/view/4");
    assert_eq!(view.create_route().to_string(), "/admin/expiry-dates/create");
}

#[tokio::test]
async fn provisional_removal_happens_before_request() {
    let (state, client) = test_app_state();
    seed_plans(&client, 3);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();

    let pending = view.begin_delete(&RecordId::from("2")).unwrap();
    assert_eq!(labels(&view), vec!["Plan 1", "Plan 3"]);
    assert!(client.calls_of(Op::Delete).is_empty());

    view.commit_delete(pending).await.unwrap();
    assert_eq!(labels(&view), vec!["Plan 1", "Plan 3"]);
}

#[tokio::test]
async fn confirmed_delete_issues_one_filtered_call() {
    let (state, client) = test_app_state();
    seed_plans(&client, 3);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    client.clear_calls();

    let id = RecordId::from("2");
    view.request_delete(&id).unwrap();
    assert_eq!(view.awaiting_confirmation(), Some(&id));
    view.confirm_delete().await.unwrap();

    let deletes = client.calls_of(Op::Delete);
    assert_eq!(deletes.len(), 1);
    assert_eq!(deletes[0].filters, vec![Filter::eq("id", "2")]);
    assert_eq!(labels(&view), vec!["Plan 1", "Plan 3"]);
    assert_eq!(view.total_count(), 2);
    // No re-fetch after delete.
    assert!(client.calls_of(Op::Select).is_empty());
}

#[tokio::test]
async fn failed_delete_restores_row_in_place() {
    let (state, client) = test_app_state();
    seed_plans(&client, 3);
    let toasts = state.toasts.clone();
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();

    client.fail_next(Op::Delete, BackendError::Response { status: 409, body: "fk".into() });
    view.request_delete(&RecordId::from("2")).unwrap();
    assert!(view.confirm_delete().await.is_err());

    assert_eq!(labels(&view), vec!["Plan 1", "Plan 2", "Plan 3"]);
    assert_eq!(view.total_count(), 3);
    assert_eq!(toasts.current().map(|t| t.message), Some("Delete failed".to_string()));
    assert_eq!(client.rows("expiry_dates").len(), 3);
}

#[tokio::test]
async fn cancelled_or_missing_confirmation_does_nothing() {
    let (state, client) = test_app_state();
    seed_plans(&client, 2);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();

    view.request_delete(&RecordId::from("1")).unwrap();
    view.cancel_delete();
    assert!(matches!(view.confirm_delete().await, Err(ListError::NoPendingDelete)));
    assert!(matches!(view.request_delete(&RecordId::from("99")), Err(ListError::RowNotFound(_))));
    assert!(client.calls_of(Op::Delete).is_empty());
    assert_eq!(view.rows().len(), 2);
}

#[tokio::test]
async fn deleting_last_row_of_last_page_moves_to_new_last_page() {
    let (state, client) = test_app_state();
    seed_plans(&client, 11);
    let mut view = ListView::new(state, &EXPIRY_DATES);
    view.fetch().await.unwrap();
    assert!(view.handle_page_change(2).await.unwrap());
    assert_eq!(labels(&view), vec!["Plan 11"]);

    view.request_delete(&RecordId::from("11")).unwrap();
    view.confirm_delete().await.unwrap();

    assert_eq!(view.total_pages(), 1);
    assert_eq!(view.page(), 1);
    assert_eq!(view.rows().len(), 10);
}

#[tokio::test]
async fn transaction_log_rows_cannot_be_deleted() {
    let (state, client) = test_app_state();
    client.seed(
        "drink_dollar_transactions",
        vec![row(json!({"id": 1, "user_id": "u-1", "action": "credit", "coins": 5, "created_at": "2024-01-01"}))],
    );
    let mut view = ListView::new(state, &DRINK_DOLLAR_TRANSACTIONS);
    view.fetch().await.unwrap();

    let id = RecordId::from("1");
    assert!(matches!(view.request_delete(&id), Err(ListError::NotWritable(_))));
    assert!(matches!(view.begin_delete(&id), Err(ListError::NotWritable(_))));
    assert_eq!(view.rows().len(), 1);
    assert!(client.calls_of(Op::Delete).is_empty());
}
