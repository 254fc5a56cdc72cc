//! Admin view state machines.
//!
//! ARCHITECTURE
//! ============
//! Views own their state and talk to the backend only through the
//! `AppState` they were built with. A UI layer renders them; the operator
//! CLI drives them directly. No view holds a reference to another.

pub mod detail;
pub mod form;
pub mod list;
pub mod sequence;
