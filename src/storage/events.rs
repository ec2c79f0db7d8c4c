use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Store;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub organizer_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A caller's registration joined with its event.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationView {
    #[serde(flatten)]
    pub registration: Registration,
    pub event: Event,
}

fn event_not_found() -> AppError { AppError::not_found("event_not_found", "Event not found") }

fn not_event_owner() -> AppError {
    AppError::forbidden("not_event_organizer", "Only the event organizer can modify this event")
}

fn require_title(input: &EventInput) -> AppResult<()> {
    if input.title.trim().is_empty() {
        return Err(AppError::user("missing_title", "Event title is required"));
    }
    Ok(())
}

impl Store {
    pub fn create_event(&self, organizer_id: i64, input: EventInput) -> AppResult<Event> {
        require_title(&input)?;
        let mut t = self.write();
        let id = t.next_event_id();
        let event = Event {
            id,
            title: input.title.trim().to_string(),
            description: input.description,
            date: input.date,
            location: input.location,
            organizer_id,
            created_at: Utc::now(),
        };
        t.events.insert(id, event.clone());
        info!(target: "store", event_id = id, organizer_id, "event created");
        Ok(event)
    }

    pub fn list_events(&self) -> Vec<Event> { self.read().events.values().cloned().collect() }

    pub fn get_event(&self, id: i64) -> AppResult<Event> {
        self.read().events.get(&id).cloned().ok_or_else(event_not_found)
    }

    pub fn update_event(&self, id: i64, caller: i64, input: EventInput) -> AppResult<Event> {
        require_title(&input)?;
        let mut t = self.write();
        let event = t.events.get_mut(&id).ok_or_else(event_not_found)?;
        if event.organizer_id != caller {
            return Err(not_event_owner());
        }
        event.title = input.title.trim().to_string();
        event.description = input.description;
        event.date = input.date;
        event.location = input.location;
        Ok(event.clone())
    }

    /// Deletes the event and every registration for it.
    pub fn delete_event(&self, id: i64, caller: i64) -> AppResult<()> {
        let mut t = self.write();
        let event = t.events.get(&id).ok_or_else(event_not_found)?;
        if event.organizer_id != caller {
            return Err(not_event_owner());
        }
        t.events.remove(&id);
        t.registrations.retain(|_, r| r.event_id != id);
        info!(target: "store", event_id = id, "event deleted");
        Ok(())
    }

    pub fn register(&self, event_id: i64, user_id: i64) -> AppResult<Registration> {
        let mut t = self.write();
        if !t.events.contains_key(&event_id) {
            return Err(event_not_found());
        }
        if t.registrations.values().any(|r| r.event_id == event_id && r.user_id == user_id) {
            return Err(AppError::conflict("already_registered", "User is already registered for this event"));
        }
        let id = t.next_registration_id();
        let reg = Registration { id, event_id, user_id, created_at: Utc::now() };
        t.registrations.insert(id, reg.clone());
        Ok(reg)
    }

    pub fn cancel_registration(&self, event_id: i64, user_id: i64) -> AppResult<()> {
        let mut t = self.write();
        let key = t
            .registrations
            .iter()
            .find(|(_, r)| r.event_id == event_id && r.user_id == user_id)
            .map(|(k, _)| *k)
            .ok_or_else(|| AppError::not_found("registration_not_found", "Registration not found"))?;
        t.registrations.remove(&key);
        Ok(())
    }

    pub fn registrations_for(&self, user_id: i64) -> Vec<RegistrationView> {
        let t = self.read();
        t.registrations
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                let event = t.events.get(&r.event_id)?.clone();
                Some(RegistrationView { registration: r.clone(), event })
            })
            .collect()
    }
}
