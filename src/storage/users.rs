use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Page, Store, SubscriptionStatus, Tables};
use crate::error::{AppError, AppResult};
use crate::identity::{Account, Role, UserDirectory};

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub cpf: String,
    pub role: Role,
    pub subscription_status: Option<SubscriptionStatus>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cpf: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

fn user_not_found() -> AppError { AppError::not_found("user_not_found", "User not found") }

impl Store {
    /// Expects already-validated input; hashes the password before taking the lock.
    pub fn create_user(&self, new: NewUser) -> AppResult<User> {
        if new.name.trim().is_empty() || new.email.trim().is_empty() || new.password.is_empty() || new.cpf.trim().is_empty() {
            return Err(AppError::user("missing_fields", "All fields are required"));
        }
        let password_hash = crate::security::hash_password(&new.password)?;
        let email = new.email.trim().to_string();

        let mut t = self.write();
        if t.users.values().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return Err(AppError::conflict("email_in_use", "Email already in use"));
        }
        let id = t.next_user_id();
        let user = User {
            id,
            name: new.name.trim().to_string(),
            email,
            password_hash,
            cpf: new.cpf,
            role: Role::Regular,
            subscription_status: None,
            created_at: Utc::now(),
        };
        t.users.insert(id, user.clone());
        info!(target: "store", user_id = id, "user created");
        Ok(user)
    }

    pub fn get_user(&self, id: i64) -> AppResult<User> {
        self.read().users.get(&id).cloned().ok_or_else(user_not_found)
    }

    pub fn list_users(&self, page: usize, limit: usize) -> Page<User> {
        let t = self.read();
        Page::slice(t.users.values(), t.users.len(), page, limit)
    }

    pub fn update_user(&self, id: i64, update: UserUpdate) -> AppResult<User> {
        if update.name.trim().is_empty() || update.password.is_empty() {
            return Err(AppError::user("missing_fields", "All fields are required"));
        }
        let password_hash = crate::security::hash_password(&update.password)?;
        let mut t = self.write();
        let user = t.users.get_mut(&id).ok_or_else(user_not_found)?;
        user.name = update.name.trim().to_string();
        user.password_hash = password_hash;
        Ok(user.clone())
    }

    /// Removes the user with their subscriptions, their registrations and the
    /// events they organize (including everyone's registrations for those).
    pub fn delete_user(&self, id: i64) -> AppResult<()> {
        let mut t = self.write();
        if t.users.remove(&id).is_none() {
            return Err(user_not_found());
        }
        t.subscriptions.retain(|_, s| s.user_id != id);
        t.events.retain(|_, e| e.organizer_id != id);
        let Tables { events, registrations, .. } = &mut *t;
        registrations.retain(|_, r| r.user_id != id && events.contains_key(&r.event_id));
        info!(target: "store", user_id = id, "user deleted");
        Ok(())
    }

}

impl UserDirectory for Store {
    fn find_by_email(&self, email: &str) -> Option<Account> {
        self.read()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| Account { id: u.id, password_hash: u.password_hash.clone(), role: u.role })
    }
}
