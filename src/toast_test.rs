use super::*;

const WINDOW: Duration = Duration::from_millis(3000);

#[test]
fn toast_visible_within_window() {
    let mut slot = ToastSlot::new(WINDOW);
    let t0 = Instant::now();
    slot.show_at("Saved", Severity::Success, t0);

    let visible = slot.current_at(t0 + Duration::from_millis(2999)).unwrap();
    assert_eq!(visible.message, "Saved");
    assert_eq!(visible.severity, Severity::Success);
}

#[test]
fn toast_clears_after_window() {
    let mut slot = ToastSlot::new(WINDOW);
    let t0 = Instant::now();
    slot.show_at("Saved", Severity::Success, t0);
    assert!(slot.current_at(t0 + WINDOW).is_none());
    // Stays cleared even if time appears to go backwards.
    assert!(slot.current_at(t0).is_none());
}

#[test]
fn new_toast_replaces_and_restarts_window() {
    let mut slot = ToastSlot::new(WINDOW);
    let t0 = Instant::now();
    slot.show_at("first", Severity::Info, t0);
    let t1 = t0 + Duration::from_millis(2000);
    slot.show_at("second", Severity::Error, t1);

    let at = t0 + Duration::from_millis(4000);
    let visible = slot.current_at(at).unwrap();
    assert_eq!(visible.message, "second");
    assert!(slot.current_at(t1 + WINDOW).is_none());
}

#[test]
fn stale_dismiss_leaves_newer_toast() {
    let mut slot = ToastSlot::new(WINDOW);
    let t0 = Instant::now();
    let first = slot.show_at("first", Severity::Info, t0);
    let second = slot.show_at("second", Severity::Info, t0);
    slot.dismiss(first);
    assert_eq!(slot.current_at(t0).map(|t| t.seq), Some(second));
    slot.dismiss(second);
    assert!(slot.current_at(t0).is_none());
}

#[test]
fn toaster_clones_share_one_slot() {
    let toaster = Toaster::new(WINDOW);
    let other = toaster.clone();
    other.error("Delete failed");
    assert_eq!(toaster.current().map(|t| t.message), Some("Delete failed".to_string()));
}

#[test]
fn toaster_dismiss_ignores_superseded_seq() {
    let toaster = Toaster::new(WINDOW);
    let first = toaster.info("3 stale items dropped");
    toaster.success("Sequence saved");
    toaster.dismiss(first);
    assert_eq!(toaster.current().map(|t| t.severity), Some(Severity::Success));
}
