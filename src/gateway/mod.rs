//! The remote data gateway boundary. The hosted backend owns authentication,
//! authorization, and every business rule (capacity, credit transfer,
//! refunds, audit logging); this crate only speaks its call contracts.

pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::AppResult;
use crate::model::{
    Attendee, Event, NewEvent, NewStoreItem, Position, Profile, Session, StoreItem, TransactionRow,
};

pub use http::HttpGateway;

/// Session lifecycle notification, delivered to subscribers whenever the
/// gateway client's cached session changes.
#[derive(Debug, Clone)]
pub enum SessionChange {
    SignedIn(Session),
    SignedOut,
}

#[async_trait]
pub trait Gateway: Send + Sync {
    // -- Auth operations ----------------------------------------------------

    /// Password sign-in. On success the cached session is replaced and a
    /// `SignedIn` change is broadcast.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session>;

    /// Registration with a post-confirmation redirect target and profile
    /// seed data. Does not sign the user in.
    async fn sign_up(&self, name: &str, email: &str, password: &str, redirect: &str)
        -> AppResult<()>;

    async fn sign_out(&self) -> AppResult<()>;

    async fn current_session(&self) -> AppResult<Option<Session>>;

    fn subscribe(&self) -> broadcast::Receiver<SessionChange>;

    async fn send_reset_email(&self, email: &str, redirect: &str) -> AppResult<()>;

    /// Sets a new password for the signed-in user (reset-password view).
    async fn update_password(&self, new_password: &str) -> AppResult<()>;

    // -- Table reads --------------------------------------------------------

    /// Events with `event_date >= now`, soonest first.
    async fn upcoming_events(&self) -> AppResult<Vec<Event>>;

    /// Every event, soonest first. Admin view.
    async fn all_events(&self) -> AppResult<Vec<Event>>;

    async fn profile(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    /// Every profile, newest first. Admin view.
    async fn profiles(&self) -> AppResult<Vec<Profile>>;

    /// Ids of events the user has joined.
    async fn joined_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Dates of every event the user has joined, for the past/future tally.
    async fn attendance_dates(&self, user_id: Uuid) -> AppResult<Vec<DateTime<Utc>>>;

    /// Attendance rows for one event with each attendee's display name and
    /// registration flag.
    async fn event_attendees(&self, event_id: Uuid) -> AppResult<Vec<Attendee>>;

    /// Audit log, newest first, with resolved display names.
    async fn transactions(&self) -> AppResult<Vec<TransactionRow>>;

    /// Store catalog, newest first.
    async fn store_items(&self) -> AppResult<Vec<StoreItem>>;

    // -- Table writes -------------------------------------------------------

    async fn insert_event(&self, event: &NewEvent) -> AppResult<()>;

    /// Deletes the event row only. Attendee refunds are a separate concern;
    /// see the admin view's delete flow.
    async fn delete_event_row(&self, event_id: Uuid) -> AppResult<()>;

    async fn update_profile_name(&self, user_id: Uuid, name: &str) -> AppResult<()>;

    async fn insert_store_item(&self, item: &NewStoreItem) -> AppResult<()>;

    async fn delete_store_item(&self, item_id: Uuid) -> AppResult<()>;

    // -- Remote procedures (opaque business transactions) -------------------

    /// Role check keyed on identity; recomputed on every session change.
    async fn has_role(&self, user_id: Uuid, role: &str) -> AppResult<bool>;

    /// Join with capacity check, credit deduction, and audit record,
    /// enforced server-side.
    async fn join_event(&self, event_id: Uuid, position: Option<Position>) -> AppResult<()>;

    /// Admin credit adjustment; the gateway clamps at zero.
    async fn adjust_credits(&self, user_id: Uuid, delta: i64, note: &str) -> AppResult<()>;

    /// Deletes the attendance row and refunds one credit, server-side.
    async fn remove_attendee(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()>;
}
