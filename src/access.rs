//! Admin access check.
//!
//! Every admin route asks the auth service for the current session and
//! trusts only its server-issued role claim. Anyone else is sent home
//! without a toast.

use tracing::{debug, info};

use crate::backend::Session;
use crate::routes::AdminRoute;
use crate::state::AppState;

#[cfg(test)]
#[path = "access_test.rs"]
mod tests;

/// Role claim value that grants admin access.
pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow(Session),
    Redirect(AdminRoute),
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }
}

#[must_use]
pub fn is_admin(session: &Session) -> bool {
    session.role.as_deref() == Some(ADMIN_ROLE)
}

/// Resolve the session and decide whether admin routes may render.
pub async fn check_access(state: &AppState) -> AccessDecision {
    match state.client.session().await {
        Ok(session) if is_admin(&session) => AccessDecision::Allow(session),
        Ok(session) => {
            info!(user_id = %session.user_id, role = ?session.role, "non-admin redirected");
            AccessDecision::Redirect(AdminRoute::Home)
        }
        Err(e) => {
            debug!(error = %e, "no session; redirecting");
            AccessDecision::Redirect(AdminRoute::Home)
        }
    }
}
