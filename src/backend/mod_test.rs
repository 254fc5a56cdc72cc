use super::*;
use serde_json::json;

fn row(v: serde_json::Value) -> Row {
    v.as_object().cloned().unwrap()
}

#[test]
fn filter_matches_numeric_id_by_text() {
    let r = row(json!({"id": 42, "name": "Gold"}));
    assert!(Filter::eq("id", "42").matches(&r));
    assert!(!Filter::eq("id", "4").matches(&r));
}

#[test]
fn filter_missing_column_never_matches() {
    let r = row(json!({"id": 1}));
    assert!(!Filter::eq("user_id", "").matches(&r));
}

#[test]
fn value_text_strips_string_quotes() {
    assert_eq!(value_text(&json!("abc")), "abc");
    assert_eq!(value_text(&json!(1.5)), "1.5");
    assert_eq!(value_text(&json!(true)), "true");
    assert_eq!(value_text(&serde_json::Value::Null), "");
}

#[test]
fn sort_direction_flips() {
    assert_eq!(SortDirection::Ascending.flipped(), SortDirection::Descending);
    assert_eq!(SortDirection::Descending.flipped(), SortDirection::Ascending);
    assert_eq!(SortDirection::default(), SortDirection::Ascending);
}

#[test]
fn query_builder_collects_parts() {
    let q = Query::new()
        .filter(Filter::eq("category_id", "7"))
        .order_by("created_at", SortDirection::Descending)
        .range(10, 19);
    assert_eq!(q.filters.len(), 1);
    assert_eq!(q.order.as_ref().map(|o| o.column.as_str()), Some("created_at"));
    assert_eq!(q.range, Some(RowRange { from: 10, to: 19 }));
}

#[test]
fn backend_error_codes_are_stable() {
    assert_eq!(BackendError::Unauthenticated.error_code(), "E_UNAUTHENTICATED");
    assert_eq!(
        BackendError::Response { status: 500, body: String::new() }.error_code(),
        "E_BACKEND_RESPONSE"
    );
}
