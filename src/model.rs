// Row types as consumed from the gateway. Authoritative storage and the
// business rules over it (capacity, credit transfer, refunds) live server-side.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated identity as returned by the gateway's auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Auth session: opaque token plus the user it belongs to. Cached by the
/// gateway client for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// One profile per identity. `credits` is only ever changed server-side:
/// admin RPCs, the join deduction, and the removal refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub credits: i64,
    #[serde(default)]
    pub registered: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Training,
    Game,
}

impl EventKind {
    /// Game-day events ask each joiner for a position.
    pub fn requires_position(&self) -> bool {
        matches!(self, Self::Game)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: i64,
    pub attendees_count: i64,
    pub created_by: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.attendees_count >= self.capacity
    }
}

/// Insert payload for the events table. Admin-only; the gateway enforces it.
#[derive(Debug, Clone, Serialize)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: i64,
    pub created_by: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: EventKind,
}

impl NewEvent {
    pub fn training(
        title: String,
        description: Option<String>,
        event_date: DateTime<Utc>,
        capacity: i64,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            title,
            description,
            event_date,
            capacity,
            created_by,
            kind: EventKind::Training,
        }
    }

    /// Games are single-slot: capacity is fixed at 1.
    pub fn game(
        title: String,
        description: Option<String>,
        event_date: DateTime<Utc>,
        created_by: Option<Uuid>,
    ) -> Self {
        Self {
            title,
            description,
            event_date,
            capacity: 1,
            created_by,
            kind: EventKind::Game,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Defender,
    Forward,
    Goalie,
    Any,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Defender,
        Position::Forward,
        Position::Goalie,
        Position::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defender => "defender",
            Self::Forward => "forward",
            Self::Goalie => "goalie",
            Self::Any => "any",
        }
    }
}

/// Attendance row joined with the attendee's profile, as shown to admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub user_id: Uuid,
    pub name: Option<String>,
    #[serde(default)]
    pub registered: bool,
    pub position: Option<Position>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    CreditGrant,
    CreditRevoke,
    JoinEvent,
    RefundEvent,
}

/// Immutable audit record; read-only from this code's perspective.
/// Names are resolved through joins on the read path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub author_user_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub author_name: Option<String>,
    pub event_title: Option<String>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: i64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewStoreItem {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub image_url: Option<String>,
    pub stock: i64,
}
