//! HTTP implementation of [`Gateway`] against the hosted backend's REST
//! surface: password-grant auth endpoints, table reads with filter
//! predicates, and named remote procedures under `rpc/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;
use tokio::sync::broadcast;
use url::Url;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use crate::gateway::{Gateway, SessionChange};
use crate::model::{
    Attendee, AuthUser, Event, NewEvent, NewStoreItem, Position, Profile, Session, StoreItem,
    TransactionKind, TransactionRow,
};

const CHANGE_CHANNEL_CAPACITY: usize = 16;

pub struct HttpGateway {
    client: reqwest::Client,
    base: Url,
    anon_key: String,
    /// Cached auth session for the lifetime of the process.
    session: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionChange>,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> AppResult<Self> {
        let base = Url::parse(&config.url)
            .map_err(|e| AppError::Config(format!("invalid gateway url: {e}")))?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            client: reqwest::Client::new(),
            base,
            anon_key: config.anon_key.clone(),
            session: RwLock::new(None),
            changes,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}auth/v1/{path}", self.base)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}rest/v1/{table}", self.base)
    }

    fn rpc_url(&self, name: &str) -> String {
        format!("{}rest/v1/rpc/{name}", self.base)
    }

    fn bearer(&self) -> String {
        let session = self.session.read().expect("session lock poisoned");
        match session.as_ref() {
            Some(s) => s.access_token.clone(),
            None => self.anon_key.clone(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn store_session(&self, session: Option<Session>) {
        *self.session.write().expect("session lock poisoned") = session.clone();
        // Nobody listening yet is fine.
        let _ = self.changes.send(match session {
            Some(s) => SessionChange::SignedIn(s),
            None => SessionChange::SignedOut,
        });
    }

    /// Surfaces a non-success response as the gateway's raw error message.
    async fn check(resp: reqwest::Response) -> AppResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::Gateway(error_message(&body, status)))
    }

    async fn check_auth(resp: reqwest::Response) -> AppResult<reqwest::Response> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Err(AppError::Auth(error_message(&body, status)))
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> AppResult<Vec<T>> {
        let resp = self
            .authed(self.client.get(self.rest_url(table)))
            .query(query)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    async fn rpc(&self, name: &str, args: serde_json::Value) -> AppResult<reqwest::Response> {
        let resp = self
            .authed(self.client.post(self.rpc_url(name)))
            .json(&args)
            .send()
            .await?;
        Self::check(resp).await
    }
}

/// Pull a human-readable message out of a gateway error body. The backend
/// uses different keys on the auth and data surfaces.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "msg", "error", "hint"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    if body.trim().is_empty() {
        format!("gateway returned {status}")
    } else {
        body.trim().to_string()
    }
}

// -- Wire shapes -----------------------------------------------------------

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUser,
}

#[derive(Deserialize)]
struct JoinedIdRow {
    event_id: Uuid,
}

#[derive(Deserialize)]
struct AttendanceDateRow {
    events: EventDateRef,
}

#[derive(Deserialize)]
struct EventDateRef {
    event_date: DateTime<Utc>,
}

#[derive(Deserialize)]
struct AttendeeRow {
    user_id: Uuid,
    position: Option<Position>,
    joined_at: DateTime<Utc>,
    profiles: Option<AttendeeProfileRef>,
}

#[derive(Deserialize)]
struct AttendeeProfileRef {
    name: Option<String>,
    #[serde(default)]
    registered: bool,
}

impl From<AttendeeRow> for Attendee {
    fn from(row: AttendeeRow) -> Self {
        let (name, registered) = match row.profiles {
            Some(p) => (p.name, p.registered),
            None => (None, false),
        };
        Attendee {
            user_id: row.user_id,
            name,
            registered,
            position: row.position,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Deserialize)]
struct TransactionWireRow {
    id: Uuid,
    user_id: Uuid,
    author_user_id: Option<Uuid>,
    event_id: Option<Uuid>,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: i64,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    user: Option<NameRef>,
    author_user: Option<NameRef>,
    events: Option<TitleRef>,
}

#[derive(Deserialize)]
struct NameRef {
    name: Option<String>,
}

#[derive(Deserialize)]
struct TitleRef {
    title: Option<String>,
}

impl From<TransactionWireRow> for TransactionRow {
    fn from(row: TransactionWireRow) -> Self {
        TransactionRow {
            id: row.id,
            user_id: row.user_id,
            author_user_id: row.author_user_id,
            event_id: row.event_id,
            user_name: row.user.and_then(|u| u.name),
            author_name: row.author_user.and_then(|u| u.name),
            event_title: row.events.and_then(|e| e.title),
            kind: row.kind,
            amount: row.amount,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

const EVENT_COLUMNS: &str =
    "id, title, description, event_date, capacity, attendees_count, created_by, type";
const PROFILE_COLUMNS: &str = "id, email, name, credits, registered, created_at, updated_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, author_user_id, event_id, type, amount, metadata, created_at, \
     user:profiles!transactions_user_id_fkey(name), \
     author_user:profiles!transactions_author_user_id_fkey(name), \
     events(title)";

#[async_trait]
impl Gateway for HttpGateway {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let resp = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let resp = Self::check_auth(resp).await?;
        let token: TokenResponse = resp.json().await?;
        let session = Session {
            access_token: token.access_token,
            user: token.user,
        };
        self.store_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
        redirect: &str,
    ) -> AppResult<()> {
        let resp = self
            .client
            .post(self.auth_url("signup"))
            .query(&[("redirect_to", redirect)])
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;
        Self::check_auth(resp).await?;
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        let resp = self
            .authed(self.client.post(self.auth_url("logout")))
            .send()
            .await?;
        Self::check_auth(resp).await?;
        self.store_session(None);
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Session>> {
        Ok(self.session.read().expect("session lock poisoned").clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn send_reset_email(&self, email: &str, redirect: &str) -> AppResult<()> {
        let resp = self
            .client
            .post(self.auth_url("recover"))
            .query(&[("redirect_to", redirect)])
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        Self::check_auth(resp).await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> AppResult<()> {
        if self.session.read().expect("session lock poisoned").is_none() {
            return Err(AppError::NotSignedIn);
        }
        let resp = self
            .authed(self.client.put(self.auth_url("user")))
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        Self::check_auth(resp).await?;
        Ok(())
    }

    async fn upcoming_events(&self) -> AppResult<Vec<Event>> {
        self.get_rows(
            "events",
            &[
                ("select", EVENT_COLUMNS.to_string()),
                ("event_date", format!("gte.{}", Utc::now().to_rfc3339())),
                ("order", "event_date.asc".to_string()),
            ],
        )
        .await
    }

    async fn all_events(&self) -> AppResult<Vec<Event>> {
        self.get_rows(
            "events",
            &[
                ("select", EVENT_COLUMNS.to_string()),
                ("order", "event_date.asc".to_string()),
            ],
        )
        .await
    }

    async fn profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let mut rows: Vec<Profile> = self
            .get_rows(
                "profiles",
                &[
                    ("select", PROFILE_COLUMNS.to_string()),
                    ("id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    async fn profiles(&self) -> AppResult<Vec<Profile>> {
        self.get_rows(
            "profiles",
            &[
                ("select", PROFILE_COLUMNS.to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn joined_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let rows: Vec<JoinedIdRow> = self
            .get_rows(
                "event_attendees",
                &[
                    ("select", "event_id".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.event_id).collect())
    }

    async fn attendance_dates(&self, user_id: Uuid) -> AppResult<Vec<DateTime<Utc>>> {
        let rows: Vec<AttendanceDateRow> = self
            .get_rows(
                "event_attendees",
                &[
                    ("select", "event_id, events!inner(event_date)".to_string()),
                    ("user_id", format!("eq.{user_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.events.event_date).collect())
    }

    async fn event_attendees(&self, event_id: Uuid) -> AppResult<Vec<Attendee>> {
        let rows: Vec<AttendeeRow> = self
            .get_rows(
                "event_attendees",
                &[
                    (
                        "select",
                        "user_id, position, joined_at, profiles(name, registered)".to_string(),
                    ),
                    ("event_id", format!("eq.{event_id}")),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(Attendee::from).collect())
    }

    async fn transactions(&self) -> AppResult<Vec<TransactionRow>> {
        let rows: Vec<TransactionWireRow> = self
            .get_rows(
                "transactions",
                &[
                    ("select", TRANSACTION_COLUMNS.to_string()),
                    ("order", "created_at.desc".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().map(TransactionRow::from).collect())
    }

    async fn store_items(&self) -> AppResult<Vec<StoreItem>> {
        self.get_rows(
            "store_items",
            &[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn insert_event(&self, event: &NewEvent) -> AppResult<()> {
        let resp = self
            .authed(self.client.post(self.rest_url("events")))
            .header("Prefer", "return=minimal")
            .json(event)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete_event_row(&self, event_id: Uuid) -> AppResult<()> {
        let resp = self
            .authed(self.client.delete(self.rest_url("events")))
            .query(&[("id", format!("eq.{event_id}"))])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn update_profile_name(&self, user_id: Uuid, name: &str) -> AppResult<()> {
        let resp = self
            .authed(self.client.patch(self.rest_url("profiles")))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "name": name }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn insert_store_item(&self, item: &NewStoreItem) -> AppResult<()> {
        let resp = self
            .authed(self.client.post(self.rest_url("store_items")))
            .header("Prefer", "return=minimal")
            .json(item)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn delete_store_item(&self, item_id: Uuid) -> AppResult<()> {
        let resp = self
            .authed(self.client.delete(self.rest_url("store_items")))
            .query(&[("id", format!("eq.{item_id}"))])
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> AppResult<bool> {
        let resp = self
            .rpc("has_role", json!({ "_user_id": user_id, "_role": role }))
            .await?;
        Ok(resp.json().await?)
    }

    async fn join_event(&self, event_id: Uuid, position: Option<Position>) -> AppResult<()> {
        let mut args = json!({ "_event_id": event_id });
        if let Some(pos) = position {
            args["_position"] = json!(pos.as_str());
        }
        self.rpc("join_event", args).await?;
        Ok(())
    }

    async fn adjust_credits(&self, user_id: Uuid, delta: i64, note: &str) -> AppResult<()> {
        self.rpc(
            "admin_update_user_credits",
            json!({ "_user_id": user_id, "_delta": delta, "_note": note }),
        )
        .await?;
        Ok(())
    }

    async fn remove_attendee(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.rpc(
            "admin_remove_attendee",
            json!({ "_event_id": event_id, "_user_id": user_id }),
        )
        .await?;
        Ok(())
    }
}
