use super::*;
use crate::resource::{EXPIRY_DATES, NOTIFICATIONS, PACKAGES};
use serde_json::json;

fn spec(resource: &Resource, name: &str) -> &'static FieldSpec {
    resource.field(name).unwrap()
}

// =============================================================
// parse_input
// =============================================================

#[test]
fn text_input_is_kept_verbatim() {
    assert_eq!(parse_input(spec(&PACKAGES, "title"), "  Gold pack ").unwrap(), json!("  Gold pack "));
}

#[test]
fn blank_numeric_input_is_null() {
    assert_eq!(parse_input(spec(&PACKAGES, "price"), "   ").unwrap(), Value::Null);
}

#[test]
fn decimal_and_integer_parse() {
    assert_eq!(parse_input(spec(&PACKAGES, "price"), "12.50").unwrap(), json!(12.5));
    assert_eq!(parse_input(spec(&EXPIRY_DATES, "days"), "30").unwrap(), json!(30));
    assert!(matches!(
        parse_input(spec(&EXPIRY_DATES, "days"), "3.5"),
        Err(FieldError::InvalidNumber { field: "days", .. })
    ));
}

#[test]
fn boolean_accepts_common_spellings() {
    let active = spec(&PACKAGES, "active");
    assert_eq!(parse_input(active, "on").unwrap(), json!(true));
    assert_eq!(parse_input(active, "FALSE").unwrap(), json!(false));
    assert!(parse_input(active, "maybe").is_err());
}

#[test]
fn date_requires_iso_shape() {
    let when = spec(&NOTIFICATIONS, "scheduled_at");
    assert_eq!(parse_input(when, "2025-02-28").unwrap(), json!("2025-02-28"));
    assert!(parse_input(when, "2025-13-01").is_err());
    assert!(parse_input(when, "28/02/2025").is_err());
}

#[test]
fn select_rejects_unknown_option() {
    let audience = spec(&NOTIFICATIONS, "audience");
    assert_eq!(parse_input(audience, "vip").unwrap(), json!("vip"));
    let err = parse_input(audience, "everyone").unwrap_err();
    assert!(err.to_string().contains("all, members, vip"));
}

// =============================================================
// validate_draft
// =============================================================

#[test]
fn empty_draft_reports_every_required_field() {
    let errors = validate_draft(&PACKAGES, &Draft::empty(&PACKAGES)).unwrap_err();
    assert!(matches!(errors.for_field("title"), Some(FieldError::Required { .. })));
    assert!(matches!(errors.for_field("price"), Some(FieldError::Required { .. })));
    assert!(errors.for_field("description").is_none());
    assert_eq!(errors.0.len(), 2);
}

#[test]
fn negative_amount_is_rejected() {
    let mut draft = Draft::empty(&PACKAGES);
    draft.set("title", json!("Starter"));
    draft.set("price", json!(-1));
    let errors = validate_draft(&PACKAGES, &draft).unwrap_err();
    assert_eq!(errors.0, vec![FieldError::Negative { field: "price", label: "Price" }]);
    assert_eq!(errors.to_string(), "Price cannot be negative");
}

#[test]
fn whitespace_title_counts_as_blank() {
    let mut draft = Draft::empty(&PACKAGES);
    draft.set("title", json!("   "));
    draft.set("price", json!(10));
    assert!(validate_draft(&PACKAGES, &draft).is_err());
}

#[test]
fn valid_draft_passes() {
    let mut draft = Draft::empty(&PACKAGES);
    draft.set("title", json!("Starter"));
    draft.set("price", json!(0));
    assert!(validate_draft(&PACKAGES, &draft).is_ok());
}
