#![allow(dead_code)]

//! Shared test doubles: a scripted in-memory gateway that applies the same
//! rules the hosted backend enforces (duplicate joins, capacity, credit
//! clamping, refund-on-removal), plus a notifier that records notices.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

use rinkside::config::Config;
use rinkside::error::{AppError, AppResult};
use rinkside::gateway::{Gateway, SessionChange};
use rinkside::model::{
    Attendee, AuthUser, Event, EventKind, NewEvent, NewStoreItem, Position, Profile, Session,
    StoreItem, TransactionRow,
};
use rinkside::notify::{Notice, NoticeKind, Notifier};

pub struct MockAttendance {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub position: Option<Position>,
    pub joined_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MockState {
    pub session: Option<Session>,
    /// email -> (password, user id)
    pub credentials: HashMap<String, (String, Uuid)>,
    pub profiles: Vec<Profile>,
    pub events: Vec<Event>,
    pub attendance: Vec<MockAttendance>,
    pub admins: HashSet<Uuid>,
    pub transactions: Vec<TransactionRow>,
    pub store: Vec<StoreItem>,
    /// Refund calls for these user ids fail, for partial-failure tests.
    pub fail_remove_for: HashSet<Uuid>,
    /// When set, sign-in always fails with this message.
    pub reject_sign_in: Option<String>,
}

pub struct MockGateway {
    pub state: Mutex<MockState>,
    pub calls: Mutex<Vec<String>>,
    changes: broadcast::Sender<SessionChange>,
}

impl MockGateway {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            state: Mutex::new(MockState::default()),
            calls: Mutex::new(Vec::new()),
            changes,
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn add_user(&self, email: &str, password: &str, name: &str, credits: i64) -> Uuid {
        let id = Uuid::new_v4();
        let mut state = self.state.lock().unwrap();
        state
            .credentials
            .insert(email.to_string(), (password.to_string(), id));
        state.profiles.push(Profile {
            id,
            email: email.to_string(),
            name: Some(name.to_string()),
            credits,
            registered: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        id
    }

    pub fn make_admin(&self, user_id: Uuid) {
        self.state.lock().unwrap().admins.insert(user_id);
    }

    pub fn add_event(&self, title: &str, capacity: i64, kind: EventKind) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().events.push(Event {
            id,
            title: title.to_string(),
            description: None,
            event_date: Utc::now() + Duration::days(7),
            capacity,
            attendees_count: 0,
            created_by: None,
            kind,
        });
        id
    }

    /// Seed the cached session, as if the client library restored one.
    pub fn preset_session(&self, user_id: Uuid, email: &str) {
        self.state.lock().unwrap().session = Some(Session {
            access_token: "test-token".into(),
            user: AuthUser {
                id: user_id,
                email: email.to_string(),
            },
        });
    }

    pub fn credits_of(&self, user_id: Uuid) -> i64 {
        self.state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .map(|p| p.credits)
            .unwrap()
    }

    pub fn event_exists(&self, event_id: Uuid) -> bool {
        self.state
            .lock()
            .unwrap()
            .events
            .iter()
            .any(|e| e.id == event_id)
    }

    /// Directly seed an attendance row (bypassing join rules).
    pub fn seed_attendance(&self, event_id: Uuid, user_id: Uuid) {
        let mut state = self.state.lock().unwrap();
        state.attendance.push(MockAttendance {
            event_id,
            user_id,
            position: None,
            joined_at: Utc::now(),
        });
        if let Some(event) = state.events.iter_mut().find(|e| e.id == event_id) {
            event.attendees_count += 1;
        }
    }

    fn current_user_id(&self) -> AppResult<Uuid> {
        self.state
            .lock()
            .unwrap()
            .session
            .as_ref()
            .map(|s| s.user.id)
            .ok_or(AppError::NotSignedIn)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        self.record(format!("sign_in:{email}"));
        let session = {
            let mut state = self.state.lock().unwrap();
            if let Some(msg) = &state.reject_sign_in {
                return Err(AppError::Auth(msg.clone()));
            }
            let Some((stored, user_id)) = state.credentials.get(email).cloned() else {
                return Err(AppError::Auth("Invalid login credentials".into()));
            };
            if stored != password {
                return Err(AppError::Auth("Invalid login credentials".into()));
            }
            let session = Session {
                access_token: format!("token-{user_id}"),
                user: AuthUser {
                    id: user_id,
                    email: email.to_string(),
                },
            };
            state.session = Some(session.clone());
            session
        };
        let _ = self.changes.send(SessionChange::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        _name: &str,
        email: &str,
        _password: &str,
        redirect: &str,
    ) -> AppResult<()> {
        self.record(format!("sign_up:{email}:{redirect}"));
        Ok(())
    }

    async fn sign_out(&self) -> AppResult<()> {
        self.record("sign_out".into());
        self.state.lock().unwrap().session = None;
        let _ = self.changes.send(SessionChange::SignedOut);
        Ok(())
    }

    async fn current_session(&self) -> AppResult<Option<Session>> {
        Ok(self.state.lock().unwrap().session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.changes.subscribe()
    }

    async fn send_reset_email(&self, email: &str, redirect: &str) -> AppResult<()> {
        self.record(format!("send_reset_email:{email}:{redirect}"));
        Ok(())
    }

    async fn update_password(&self, _new_password: &str) -> AppResult<()> {
        self.record("update_password".into());
        self.current_user_id()?;
        Ok(())
    }

    async fn upcoming_events(&self) -> AppResult<Vec<Event>> {
        self.record("upcoming_events".into());
        let now = Utc::now();
        Ok(self
            .state
            .lock()
            .unwrap()
            .events
            .iter()
            .filter(|e| e.event_date >= now)
            .cloned()
            .collect())
    }

    async fn all_events(&self) -> AppResult<Vec<Event>> {
        self.record("all_events".into());
        Ok(self.state.lock().unwrap().events.clone())
    }

    async fn profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        self.record(format!("profile:{user_id}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .profiles
            .iter()
            .find(|p| p.id == user_id)
            .cloned())
    }

    async fn profiles(&self) -> AppResult<Vec<Profile>> {
        self.record("profiles".into());
        Ok(self.state.lock().unwrap().profiles.clone())
    }

    async fn joined_event_ids(&self, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.record("joined_event_ids".into());
        Ok(self
            .state
            .lock()
            .unwrap()
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .map(|a| a.event_id)
            .collect())
    }

    async fn attendance_dates(&self, user_id: Uuid) -> AppResult<Vec<DateTime<Utc>>> {
        self.record("attendance_dates".into());
        let state = self.state.lock().unwrap();
        Ok(state
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .filter_map(|a| {
                state
                    .events
                    .iter()
                    .find(|e| e.id == a.event_id)
                    .map(|e| e.event_date)
            })
            .collect())
    }

    async fn event_attendees(&self, event_id: Uuid) -> AppResult<Vec<Attendee>> {
        self.record(format!("event_attendees:{event_id}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .attendance
            .iter()
            .filter(|a| a.event_id == event_id)
            .map(|a| {
                let profile = state.profiles.iter().find(|p| p.id == a.user_id);
                Attendee {
                    user_id: a.user_id,
                    name: profile.and_then(|p| p.name.clone()),
                    registered: profile.map(|p| p.registered).unwrap_or(false),
                    position: a.position,
                    joined_at: a.joined_at,
                }
            })
            .collect())
    }

    async fn transactions(&self) -> AppResult<Vec<TransactionRow>> {
        self.record("transactions".into());
        Ok(self.state.lock().unwrap().transactions.clone())
    }

    async fn store_items(&self) -> AppResult<Vec<StoreItem>> {
        self.record("store_items".into());
        Ok(self.state.lock().unwrap().store.clone())
    }

    async fn insert_event(&self, event: &NewEvent) -> AppResult<()> {
        self.record(format!("insert_event:{}", event.title));
        self.state.lock().unwrap().events.push(Event {
            id: Uuid::new_v4(),
            title: event.title.clone(),
            description: event.description.clone(),
            event_date: event.event_date,
            capacity: event.capacity,
            attendees_count: 0,
            created_by: event.created_by,
            kind: event.kind,
        });
        Ok(())
    }

    async fn delete_event_row(&self, event_id: Uuid) -> AppResult<()> {
        self.record(format!("delete_event_row:{event_id}"));
        self.state
            .lock()
            .unwrap()
            .events
            .retain(|e| e.id != event_id);
        Ok(())
    }

    async fn update_profile_name(&self, user_id: Uuid, name: &str) -> AppResult<()> {
        self.record(format!("update_profile_name:{user_id}"));
        let mut state = self.state.lock().unwrap();
        if let Some(profile) = state.profiles.iter_mut().find(|p| p.id == user_id) {
            profile.name = Some(name.to_string());
        }
        Ok(())
    }

    async fn insert_store_item(&self, item: &NewStoreItem) -> AppResult<()> {
        self.record(format!("insert_store_item:{}", item.name));
        self.state.lock().unwrap().store.push(StoreItem {
            id: Uuid::new_v4(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            image_url: item.image_url.clone(),
            stock: item.stock,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn delete_store_item(&self, item_id: Uuid) -> AppResult<()> {
        self.record(format!("delete_store_item:{item_id}"));
        self.state
            .lock()
            .unwrap()
            .store
            .retain(|i| i.id != item_id);
        Ok(())
    }

    async fn has_role(&self, user_id: Uuid, role: &str) -> AppResult<bool> {
        self.record(format!("has_role:{role}"));
        Ok(role == "admin" && self.state.lock().unwrap().admins.contains(&user_id))
    }

    async fn join_event(&self, event_id: Uuid, position: Option<Position>) -> AppResult<()> {
        self.record(format!(
            "join_event:{event_id}:{}",
            position.map(|p| p.as_str()).unwrap_or("-")
        ));
        let user_id = self.current_user_id()?;
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        if state
            .attendance
            .iter()
            .any(|a| a.event_id == event_id && a.user_id == user_id)
        {
            return Err(AppError::Gateway("Already joined".into()));
        }
        let Some(event) = state.events.iter_mut().find(|e| e.id == event_id) else {
            return Err(AppError::Gateway("Event not found".into()));
        };
        if event.attendees_count >= event.capacity {
            return Err(AppError::Gateway("Event is full".into()));
        }
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| AppError::Gateway("Profile not found".into()))?;
        if profile.credits < 1 {
            return Err(AppError::Gateway("Insufficient credits".into()));
        }
        profile.credits -= 1;
        event.attendees_count += 1;
        state.attendance.push(MockAttendance {
            event_id,
            user_id,
            position,
            joined_at: Utc::now(),
        });
        Ok(())
    }

    async fn adjust_credits(&self, user_id: Uuid, delta: i64, note: &str) -> AppResult<()> {
        self.record(format!("adjust_credits:{user_id}:{delta}:{note}"));
        let mut state = self.state.lock().unwrap();
        let Some(profile) = state.profiles.iter_mut().find(|p| p.id == user_id) else {
            return Err(AppError::Gateway("Profile not found".into()));
        };
        if profile.credits + delta < 0 {
            return Err(AppError::Gateway("Credits cannot go negative".into()));
        }
        profile.credits += delta;
        Ok(())
    }

    async fn remove_attendee(&self, event_id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.record(format!("remove_attendee:{event_id}:{user_id}"));
        let mut state = self.state.lock().unwrap();
        if state.fail_remove_for.contains(&user_id) {
            return Err(AppError::Gateway("Refund failed".into()));
        }
        let before = state.attendance.len();
        state
            .attendance
            .retain(|a| !(a.event_id == event_id && a.user_id == user_id));
        if state.attendance.len() == before {
            return Err(AppError::Gateway("Attendance not found".into()));
        }
        if let Some(event) = state.events.iter_mut().find(|e| e.id == event_id) {
            event.attendees_count -= 1;
        }
        if let Some(profile) = state.profiles.iter_mut().find(|p| p.id == user_id) {
            profile.credits += 1;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.all()
            .into_iter()
            .filter(|n| n.kind == NoticeKind::Error)
            .collect()
    }

    pub fn successes(&self) -> Vec<Notice> {
        self.all()
            .into_iter()
            .filter(|n| n.kind == NoticeKind::Success)
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().unwrap().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// Config with harmless defaults for context construction.
pub fn test_config() -> Config {
    Config::default()
}
