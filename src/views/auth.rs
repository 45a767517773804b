//! Login/register and reset-password form flows. Auth operations rethrow
//! from the session context, so a failed call keeps the visitor on the form
//! instead of navigating.

use std::sync::Arc;

use crate::guard::DASHBOARD_ROUTE;
use crate::session::SessionContext;

pub const SIGN_IN_ROUTE: &str = crate::guard::SIGN_IN_ROUTE;

pub struct AuthFlow {
    session: Arc<SessionContext>,
    /// Doubles as the submit buttons' disabled state.
    pub busy: bool,
    pub login_email: String,
    pub login_password: String,
    pub register_name: String,
    pub register_email: String,
    pub register_password: String,
}

impl AuthFlow {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            session,
            busy: false,
            login_email: String::new(),
            login_password: String::new(),
            register_name: String::new(),
            register_email: String::new(),
            register_password: String::new(),
        }
    }

    pub fn can_login(&self) -> bool {
        !self.busy && !self.login_email.is_empty() && !self.login_password.is_empty()
    }

    pub fn can_register(&self) -> bool {
        !self.busy
            && !self.register_name.is_empty()
            && !self.register_email.is_empty()
            && !self.register_password.is_empty()
    }

    /// Returns the route to navigate to on success; `None` stays on the
    /// form (the failure notice was already surfaced).
    pub async fn login(&mut self) -> Option<&'static str> {
        if !self.can_login() {
            return None;
        }
        self.busy = true;
        let result = self
            .session
            .sign_in(&self.login_email, &self.login_password)
            .await;
        self.busy = false;
        result.ok().map(|_| DASHBOARD_ROUTE)
    }

    /// Registration never navigates: the confirmation-pending notice tells
    /// the visitor to check their email.
    pub async fn register(&mut self) {
        if !self.can_register() {
            return;
        }
        self.busy = true;
        let _ = self
            .session
            .sign_up(
                &self.register_name,
                &self.register_email,
                &self.register_password,
            )
            .await;
        self.busy = false;
    }

    pub async fn request_reset(&mut self, email: &str) {
        if email.is_empty() {
            return;
        }
        self.busy = true;
        let _ = self.session.reset_password(email).await;
        self.busy = false;
    }
}

/// Reset-password view, reached from the emailed link.
pub struct ResetPasswordFlow {
    session: Arc<SessionContext>,
    pub busy: bool,
    pub password: String,
}

impl ResetPasswordFlow {
    pub fn new(session: Arc<SessionContext>) -> Self {
        Self {
            session,
            busy: false,
            password: String::new(),
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.busy && !self.password.is_empty()
    }

    /// On success, navigate back to the sign-in view.
    pub async fn submit(&mut self) -> Option<&'static str> {
        if !self.can_submit() {
            return None;
        }
        self.busy = true;
        let result = self.session.update_password(&self.password).await;
        self.busy = false;
        result.ok().map(|_| SIGN_IN_ROUTE)
    }
}
