//! Admin surface: event lifecycle, user credits, attendee management, and
//! the store catalog. Every mutation goes through an admin-gated gateway
//! call; the client never re-validates what the gateway enforces.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::model::{Attendee, Event, EventKind, NewEvent, NewStoreItem, Profile};
use crate::notify::{Notice, Notifier};
use crate::session::SessionContext;

/// Form state for the create-event card. Validation here only gates the
/// button; the gateway is the authority.
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub event_date: Option<DateTime<Utc>>,
    pub capacity: i64,
    pub kind: EventKind,
}

impl Default for EventDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            event_date: None,
            capacity: 26,
            kind: EventKind::Training,
        }
    }
}

impl EventDraft {
    pub fn is_valid(&self) -> bool {
        !self.title.is_empty()
            && self.event_date.is_some()
            && (self.kind == EventKind::Game || self.capacity >= 1)
    }

    fn into_new_event(self, created_by: Option<Uuid>) -> Option<NewEvent> {
        let event_date = self.event_date?;
        let description = if self.description.is_empty() {
            None
        } else {
            Some(self.description)
        };
        Some(match self.kind {
            EventKind::Training => NewEvent::training(
                self.title,
                description,
                event_date,
                self.capacity,
                created_by,
            ),
            EventKind::Game => NewEvent::game(self.title, description, event_date, created_by),
        })
    }
}

pub struct AdminView {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionContext>,
    pub events: Vec<Event>,
    pub profiles: Vec<Profile>,
    pub loading: bool,
    /// Only one event's attendee list is shown at a time.
    pub selected_event: Option<Uuid>,
    pub attendees: Vec<Attendee>,
}

impl AdminView {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        notifier: Arc<dyn Notifier>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            gateway,
            notifier,
            session,
            events: Vec::new(),
            profiles: Vec::new(),
            loading: true,
            selected_event: None,
            attendees: Vec::new(),
        }
    }

    pub async fn load(&mut self) {
        self.load_events().await;
        self.load_profiles().await;
        self.loading = false;
    }

    async fn load_events(&mut self) {
        match self.gateway.all_events().await {
            Ok(events) => self.events = events,
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load events", e.to_string())),
        }
    }

    async fn load_profiles(&mut self) {
        match self.gateway.profiles().await {
            Ok(profiles) => self.profiles = profiles,
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load users", e.to_string())),
        }
    }

    pub async fn create_event(&mut self, draft: EventDraft) {
        if !draft.is_valid() {
            return;
        }
        let created_by = self.session.snapshot().user.map(|u| u.id);
        let Some(new_event) = draft.into_new_event(created_by) else {
            return;
        };
        if let Err(e) = self.gateway.insert_event(&new_event).await {
            self.notifier
                .notify(Notice::error("Create failed", e.to_string()));
            return;
        }
        self.notifier.notify(Notice::success("Event created"));
        self.load_events().await;
    }

    /// Refund every attendee, one at a time, then delete the event row. A
    /// failed refund aborts the whole flow: later refunds and the delete are
    /// never issued, and refunds already applied stay applied.
    pub async fn delete_event(&mut self, event_id: Uuid) {
        let attendees = match self.gateway.event_attendees(event_id).await {
            Ok(rows) => rows,
            Err(e) => {
                self.notifier
                    .notify(Notice::error("Delete failed", e.to_string()));
                return;
            }
        };
        for attendee in &attendees {
            if let Err(e) = self.gateway.remove_attendee(event_id, attendee.user_id).await {
                self.notifier
                    .notify(Notice::error("Delete failed", e.to_string()));
                return;
            }
        }
        if let Err(e) = self.gateway.delete_event_row(event_id).await {
            self.notifier
                .notify(Notice::error("Delete failed", e.to_string()));
            return;
        }
        self.notifier.notify(Notice::success("Event deleted"));
        if self.selected_event == Some(event_id) {
            self.selected_event = None;
            self.attendees.clear();
        }
        self.load_events().await;
        self.load_profiles().await;
    }

    /// Delta is +1 or -1 per the UI affordance; the gateway clamps at zero.
    pub async fn adjust_credits(&mut self, user_id: Uuid, delta: i64) {
        if let Err(e) = self.gateway.adjust_credits(user_id, delta, "manual").await {
            self.notifier
                .notify(Notice::error("Update failed", e.to_string()));
            return;
        }
        let title = if delta > 0 {
            "Credits added"
        } else {
            "Credits removed"
        };
        self.notifier.notify(Notice::success(title));
        self.load_profiles().await;
    }

    /// Replaces any previously displayed attendee list.
    pub async fn view_attendees(&mut self, event_id: Uuid) {
        self.selected_event = Some(event_id);
        match self.gateway.event_attendees(event_id).await {
            Ok(rows) => self.attendees = rows,
            Err(e) => self
                .notifier
                .notify(Notice::error("Load attendees failed", e.to_string())),
        }
    }

    pub async fn remove_attendee(&mut self, event_id: Uuid, user_id: Uuid) {
        if let Err(e) = self.gateway.remove_attendee(event_id, user_id).await {
            self.notifier
                .notify(Notice::error("Removal failed", e.to_string()));
            return;
        }
        self.notifier
            .notify(Notice::success("Attendee removed and refunded"));
        self.view_attendees(event_id).await;
        self.load_events().await;
        self.load_profiles().await;
    }

    pub async fn add_store_item(&mut self, item: NewStoreItem) {
        if let Err(e) = self.gateway.insert_store_item(&item).await {
            self.notifier
                .notify(Notice::error("Create failed", e.to_string()));
            return;
        }
        self.notifier.notify(Notice::success("Item added"));
    }

    pub async fn remove_store_item(&mut self, item_id: Uuid) {
        if let Err(e) = self.gateway.delete_store_item(item_id).await {
            self.notifier
                .notify(Notice::error("Delete failed", e.to_string()));
            return;
        }
        self.notifier.notify(Notice::success("Item removed"));
    }
}
