//! Single-slot, auto-expiring user notifications.
//!
//! DESIGN
//! ======
//! There is exactly one toast at a time. Showing a new toast replaces the
//! current one outright (no queue) and restarts the visibility window.
//! Expiry is computed from the show instant, so readers never see a stale
//! toast even if nothing actively clears it.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    /// Bumped on every show; lets a delayed clear tell whether it is stale.
    pub seq: u64,
    shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ToastSlot {
    current: Option<Toast>,
    duration: Duration,
    seq: u64,
}

impl ToastSlot {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { current: None, duration, seq: 0 }
    }

    /// Show `message`, replacing whatever is visible. Returns the toast's seq.
    pub fn show_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> u64 {
        self.seq += 1;
        self.current = Some(Toast { message: message.into(), severity, seq: self.seq, shown_at: now });
        self.seq
    }

    /// The visible toast at `now`; drops it once its window has elapsed.
    pub fn current_at(&mut self, now: Instant) -> Option<&Toast> {
        let expired = self
            .current
            .as_ref()
            .is_some_and(|t| now.saturating_duration_since(t.shown_at) >= self.duration);
        if expired {
            self.current = None;
        }
        self.current.as_ref()
    }

    /// Clear the toast only if it is still the one identified by `seq`.
    pub fn dismiss(&mut self, seq: u64) {
        if self.current.as_ref().is_some_and(|t| t.seq == seq) {
            self.current = None;
        }
    }
}

/// Shared handle to the toast slot. Cheap to clone; every view holds one.
#[derive(Debug, Clone)]
pub struct Toaster {
    slot: Arc<Mutex<ToastSlot>>,
}

impl Toaster {
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self { slot: Arc::new(Mutex::new(ToastSlot::new(duration))) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ToastSlot> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn show(&self, message: impl Into<String>, severity: Severity) -> u64 {
        self.lock().show_at(message, severity, Instant::now())
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Success)
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Info)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.show(message, Severity::Error)
    }

    /// Snapshot of the visible toast.
    #[must_use]
    pub fn current(&self) -> Option<Toast> {
        self.lock().current_at(Instant::now()).cloned()
    }

    pub fn dismiss(&self, seq: u64) {
        self.lock().dismiss(seq);
    }
}
