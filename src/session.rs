//! Session/Auth context: single source of truth for "who is signed in and
//! what can they do", plus the imperative surface for identity mutations.
//!
//! Lifecycle: [`SessionContext::init`] subscribes to the gateway's
//! session-change notifications and concurrently checks the current session;
//! `loading` clears only after that initial check completes. Profile and
//! admin-role fetches triggered by a notification run on a spawned task, so
//! the notification handler always returns before any dependent gateway call
//! begins (re-entering the gateway client from inside its own notification
//! callback can deadlock it).

use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::AppResult;
use crate::gateway::{Gateway, SessionChange};
use crate::model::{AuthUser, Profile, Session};
use crate::notify::{Notice, Notifier};

/// Read-only view of the auth state. `profile` stays `None` until its
/// background fetch completes; `is_admin` is recomputed on every session
/// change, never cached across sign-ins.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub user: Option<AuthUser>,
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub is_admin: bool,
    pub loading: bool,
}

struct Inner {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<Snapshot>,
}

impl Inner {
    fn with_state<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut state = self.state.write().expect("session state lock poisoned");
        f(&mut state)
    }

    async fn fetch_profile(&self, user_id: uuid::Uuid) {
        match self.gateway.profile(user_id).await {
            Ok(profile) => self.with_state(|s| s.profile = profile),
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load profile", e.to_string())),
        }
    }

    async fn fetch_is_admin(&self, user_id: uuid::Uuid) {
        // A failed role check degrades to non-admin, silently.
        let is_admin = self
            .gateway
            .has_role(user_id, "admin")
            .await
            .unwrap_or(false);
        self.with_state(|s| s.is_admin = is_admin);
    }

    fn apply_session(&self, session: Option<Session>) {
        self.with_state(|s| {
            s.user = session.as_ref().map(|sess| sess.user.clone());
            s.session = session;
            if s.user.is_none() {
                s.profile = None;
                s.is_admin = false;
            }
        });
    }
}

pub struct SessionContext {
    inner: Arc<Inner>,
    signup_redirect: String,
    reset_redirect: String,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionContext {
    /// Bring the context up: subscribe to session changes, then resolve the
    /// current session and (if signed in) its profile and admin flag before
    /// clearing `loading`.
    pub async fn init(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> Self {
        let inner = Arc::new(Inner {
            gateway: gateway.clone(),
            notifier,
            state: RwLock::new(Snapshot {
                loading: true,
                ..Snapshot::default()
            }),
        });

        let mut changes = gateway.subscribe();
        let listener_inner = inner.clone();
        let listener = tokio::spawn(async move {
            while let Ok(change) = changes.recv().await {
                match change {
                    SessionChange::SignedIn(session) => {
                        let user_id = session.user.id;
                        listener_inner.apply_session(Some(session));
                        // Deferred: dependent fetches start only after this
                        // handler has returned to the channel loop.
                        let fetch_inner = listener_inner.clone();
                        tokio::spawn(async move {
                            futures::join!(
                                fetch_inner.fetch_profile(user_id),
                                fetch_inner.fetch_is_admin(user_id),
                            );
                        });
                    }
                    SessionChange::SignedOut => listener_inner.apply_session(None),
                }
            }
        });

        match inner.gateway.current_session().await {
            Ok(Some(session)) => {
                let user_id = session.user.id;
                inner.apply_session(Some(session));
                futures::join!(inner.fetch_profile(user_id), inner.fetch_is_admin(user_id));
            }
            Ok(None) => inner.apply_session(None),
            Err(e) => {
                tracing::warn!("initial session check failed: {e}");
                inner.apply_session(None);
            }
        }
        inner.with_state(|s| s.loading = false);

        Self {
            inner,
            signup_redirect: config.signup_redirect(),
            reset_redirect: config.reset_redirect(),
            listener: Mutex::new(Some(listener)),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner
            .state
            .read()
            .expect("session state lock poisoned")
            .clone()
    }

    /// Stop listening for session changes. Idempotent; also runs on drop.
    pub fn teardown(&self) {
        if let Some(handle) = self
            .listener
            .lock()
            .expect("listener lock poisoned")
            .take()
        {
            handle.abort();
        }
    }

    /// Sign in with password. Sets no local state itself: the subscription
    /// delivery performs the transition. Errors are surfaced and rethrown so
    /// the caller can abort its own flow.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<()> {
        if let Err(e) = self.inner.gateway.sign_in(email, password).await {
            self.inner
                .notifier
                .notify(Notice::error("Sign in failed", e.to_string()));
            return Err(e);
        }
        Ok(())
    }

    /// Register a new account. Does not sign the user in; they confirm via
    /// the emailed link first.
    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> AppResult<()> {
        if let Err(e) = self
            .inner
            .gateway
            .sign_up(name, email, password, &self.signup_redirect)
            .await
        {
            self.inner
                .notifier
                .notify(Notice::error("Sign up failed", e.to_string()));
            return Err(e);
        }
        self.inner
            .notifier
            .notify(Notice::success("Check your email to confirm your account"));
        Ok(())
    }

    /// Sign out, then synchronously clear the profile and admin flag. The
    /// user/session fields are cleared by the subsequent notification.
    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.gateway.sign_out().await {
            self.inner
                .notifier
                .notify(Notice::error("Sign out failed", e.to_string()));
        } else {
            self.inner.notifier.notify(Notice::success("Signed out"));
        }
        self.inner.with_state(|s| {
            s.profile = None;
            s.is_admin = false;
        });
    }

    /// Update the signed-in user's display name; no-op when signed out.
    pub async fn update_name(&self, name: &str) -> AppResult<()> {
        let Some(user) = self.snapshot().user else {
            return Ok(());
        };
        if let Err(e) = self.inner.gateway.update_profile_name(user.id, name).await {
            self.inner
                .notifier
                .notify(Notice::error("Update failed", e.to_string()));
            return Err(e);
        }
        self.inner.notifier.notify(Notice::success("Profile updated"));
        self.inner.fetch_profile(user.id).await;
        Ok(())
    }

    /// Re-fetch and overwrite the cached profile; no-op when signed out.
    /// Silent on success.
    pub async fn refresh_profile(&self) {
        let Some(user) = self.snapshot().user else {
            return;
        };
        self.inner.fetch_profile(user.id).await;
    }

    /// Send a password-reset email pointing at the reset-password view.
    pub async fn reset_password(&self, email: &str) -> AppResult<()> {
        if let Err(e) = self
            .inner
            .gateway
            .send_reset_email(email, &self.reset_redirect)
            .await
        {
            self.inner
                .notifier
                .notify(Notice::error("Reset failed", e.to_string()));
            return Err(e);
        }
        self.inner
            .notifier
            .notify(Notice::success("Check your email for a reset link"));
        Ok(())
    }

    /// Set a new password for the signed-in user (reset-password view).
    pub async fn update_password(&self, new_password: &str) -> AppResult<()> {
        if let Err(e) = self.inner.gateway.update_password(new_password).await {
            self.inner
                .notifier
                .notify(Notice::error("Failed to update password", e.to_string()));
            return Err(e);
        }
        self.inner
            .notifier
            .notify(Notice::success("Password updated! You can now login"));
        Ok(())
    }

    /// Convenience used by callers that must distinguish "still resolving"
    /// from "signed out".
    pub fn is_loading(&self) -> bool {
        self.snapshot().loading
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_anonymous() {
        let snap = Snapshot::default();
        assert!(snap.user.is_none());
        assert!(snap.profile.is_none());
        assert!(!snap.is_admin);
        assert!(!snap.loading);
    }
}
