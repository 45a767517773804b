//! Member dashboard: upcoming events, attendance stats, and the join
//! workflow (capacity- and credit-gated, with a position prompt for games).

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::gateway::Gateway;
use crate::model::{Event, EventKind, Position};
use crate::notify::{Notice, Notifier};
use crate::session::SessionContext;

/// Why the join action is enabled or disabled for one event. When several
/// reasons apply the first in this order wins: already going, full, not
/// enough credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinEligibility {
    Going,
    Full,
    NotEnoughCredits,
    Eligible,
}

impl JoinEligibility {
    pub fn is_disabled(&self) -> bool {
        !matches!(self, Self::Eligible)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Going => "You're going",
            Self::Full => "Full",
            Self::NotEnoughCredits => "Not enough credits",
            Self::Eligible => "Join (1 credit)",
        }
    }
}

/// Advisory only: the gateway re-checks capacity and credits on join and may
/// still reject (e.g. someone else takes the last spot between render and
/// click).
pub fn eligibility(event: &Event, joined: &HashSet<Uuid>, credits: i64) -> JoinEligibility {
    if joined.contains(&event.id) {
        JoinEligibility::Going
    } else if event.is_full() {
        JoinEligibility::Full
    } else if credits < 1 {
        JoinEligibility::NotEnoughCredits
    } else {
        JoinEligibility::Eligible
    }
}

/// Training events show a capacity bar; games are single-slot and render a
/// fixed capacity instead.
pub fn shows_capacity_bar(event: &Event) -> bool {
    event.kind == EventKind::Training
}

/// Position choice prompt for game-kind events. Confirm stays disabled until
/// one of the four options is picked.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionPrompt {
    pub event_id: Uuid,
    pub selected: Option<Position>,
}

impl PositionPrompt {
    pub fn options(&self) -> [Position; 4] {
        Position::ALL
    }

    pub fn can_confirm(&self) -> bool {
        self.selected.is_some()
    }
}

pub struct DashboardView {
    gateway: Arc<dyn Gateway>,
    notifier: Arc<dyn Notifier>,
    session: Arc<SessionContext>,
    pub events: Vec<Event>,
    pub joined_event_ids: HashSet<Uuid>,
    pub past_events_count: usize,
    pub future_events_count: usize,
    pub loading: bool,
    pub prompt: Option<PositionPrompt>,
}

impl DashboardView {
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
            joined_event_ids: HashSet::new(),
            past_events_count: 0,
            future_events_count: 0,
            loading: true,
            prompt: None,
        }
    }

    /// Mount: fetch upcoming events, the joined-id set, and the past/future
    /// tallies. Each fetch catches its own error.
    pub async fn load(&mut self) {
        self.load_events().await;
        self.load_joined().await;
        self.load_counts().await;
    }

    async fn load_events(&mut self) {
        match self.gateway.upcoming_events().await {
            Ok(events) => self.events = events,
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load events", e.to_string())),
        }
        self.loading = false;
    }

    async fn load_joined(&mut self) {
        let Some(user) = self.session.snapshot().user else {
            return;
        };
        match self.gateway.joined_event_ids(user.id).await {
            Ok(ids) => self.joined_event_ids = ids.into_iter().collect(),
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load joined events", e.to_string())),
        }
    }

    async fn load_counts(&mut self) {
        let Some(user) = self.session.snapshot().user else {
            return;
        };
        match self.gateway.attendance_dates(user.id).await {
            Ok(dates) => {
                let now = Utc::now();
                self.past_events_count = dates.iter().filter(|d| **d < now).count();
                self.future_events_count = dates.iter().filter(|d| **d >= now).count();
            }
            Err(e) => self
                .notifier
                .notify(Notice::error("Failed to load event counts", e.to_string())),
        }
    }

    pub fn credits(&self) -> i64 {
        self.session
            .snapshot()
            .profile
            .map(|p| p.credits)
            .unwrap_or(0)
    }

    pub fn eligibility(&self, event: &Event) -> JoinEligibility {
        eligibility(event, &self.joined_event_ids, self.credits())
    }

    /// Join entry point. Games open the position prompt; training events
    /// join directly.
    pub async fn request_join(&mut self, event_id: Uuid) {
        let requires_position = self
            .events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| e.kind.requires_position())
            .unwrap_or(false);
        if requires_position {
            self.prompt = Some(PositionPrompt {
                event_id,
                selected: None,
            });
        } else {
            self.join(event_id, None).await;
        }
    }

    pub fn select_position(&mut self, position: Position) {
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.selected = Some(position);
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Confirm the prompt; no-op until a position is selected.
    pub async fn confirm_join(&mut self) {
        let Some(prompt) = self.prompt.clone() else {
            return;
        };
        let Some(position) = prompt.selected else {
            return;
        };
        self.prompt = None;
        self.join(prompt.event_id, Some(position)).await;
    }

    /// On success, re-fetch events, joined ids, tallies, then the profile
    /// (to pick up the credit deduction), in that order. On failure local
    /// state is left untouched.
    async fn join(&mut self, event_id: Uuid, position: Option<Position>) {
        if let Err(e) = self.gateway.join_event(event_id, position).await {
            self.notifier
                .notify(Notice::error("Unable to join", e.to_string()));
            return;
        }
        self.notifier.notify(Notice::success("Joined event"));
        self.load_events().await;
        self.load_joined().await;
        self.load_counts().await;
        self.session.refresh_profile().await;
    }
}
