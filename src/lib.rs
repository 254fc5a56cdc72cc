//! Admin console core for the Chiongster nightlife app.
//!
//! ARCHITECTURE
//! ============
//! A static resource catalog describes every admin-managed table. Generic
//! list, detail, and sequence views drive CRUD against an injected
//! [`backend::DataClient`]; the ledger module handles drink-dollar balance
//! adjustments. Views report outcomes through a single-slot toast.

pub mod access;
pub mod backend;
pub mod config;
pub mod ledger;
pub mod record;
pub mod resource;
pub mod routes;
pub mod state;
pub mod toast;
pub mod validate;
pub mod views;
