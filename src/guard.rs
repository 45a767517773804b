//! Route guards: pure decisions over a session [`Snapshot`]. While the
//! context is still loading they render nothing rather than flashing an
//! incorrect state.

use crate::session::Snapshot;

/// Where unauthenticated visitors are sent.
pub const SIGN_IN_ROUTE: &str = "/auth";
/// Default landing view for authenticated users.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session still resolving; suspend the view.
    Pending,
    /// Send the visitor elsewhere. `from` preserves the originally requested
    /// location for post-login restoration.
    Redirect {
        to: &'static str,
        from: Option<String>,
    },
    /// Render the protected view.
    Allow,
}

/// Guard for member-only views.
pub fn guard_member(snapshot: &Snapshot, requested: &str) -> GuardOutcome {
    if snapshot.loading {
        return GuardOutcome::Pending;
    }
    if snapshot.user.is_none() {
        return GuardOutcome::Redirect {
            to: SIGN_IN_ROUTE,
            from: Some(requested.to_string()),
        };
    }
    GuardOutcome::Allow
}

/// Guard for admin-only views: authenticated non-admins are sent to the
/// default landing view instead.
pub fn guard_admin(snapshot: &Snapshot, requested: &str) -> GuardOutcome {
    match guard_member(snapshot, requested) {
        GuardOutcome::Allow if !snapshot.is_admin => GuardOutcome::Redirect {
            to: DASHBOARD_ROUTE,
            from: None,
        },
        outcome => outcome,
    }
}
