use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::identity::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    Annual,
}

impl Plan {
    pub fn period(&self) -> Duration {
        match self {
            Plan::Monthly => Duration::days(30),
            Plan::Annual => Duration::days(365),
        }
    }
}

impl FromStr for Plan {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" => Ok(Plan::Monthly),
            "annual" => Ok(Plan::Annual),
            _ => Err(AppError::user("invalid_plan", "Plan must be monthly or annual")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

fn no_active() -> AppError { AppError::not_found("no_active_subscription", "User has no active subscription") }

impl Store {
    /// Start a subscription and promote the user to organizer.
    pub fn subscribe(&self, user_id: i64, plan: Plan, now: DateTime<Utc>) -> AppResult<Subscription> {
        self.expire_lapsed(user_id, now);
        let mut t = self.write();
        if !t.users.contains_key(&user_id) {
            return Err(AppError::not_found("user_not_found", "User not found"));
        }
        if t.subscriptions.values().any(|s| s.user_id == user_id && s.status == SubscriptionStatus::Active) {
            return Err(AppError::conflict("subscription_active", "User already has an active subscription"));
        }
        let id = t.next_subscription_id();
        let sub = Subscription {
            id,
            user_id,
            plan,
            status: SubscriptionStatus::Active,
            start_date: now,
            end_date: now + plan.period(),
        };
        t.subscriptions.insert(id, sub.clone());
        if let Some(user) = t.users.get_mut(&user_id) {
            user.role = Role::Organizer;
            user.subscription_status = Some(SubscriptionStatus::Active);
        }
        info!(target: "store", user_id, subscription_id = id, ?plan, "user upgraded to organizer");
        Ok(sub)
    }

    pub fn active_subscription(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<Subscription> {
        self.expire_lapsed(user_id, now);
        self.read()
            .subscriptions
            .values()
            .find(|s| s.user_id == user_id && s.status == SubscriptionStatus::Active)
            .cloned()
            .ok_or_else(no_active)
    }

    pub fn cancel_subscription(&self, user_id: i64, now: DateTime<Utc>) -> AppResult<Subscription> {
        self.expire_lapsed(user_id, now);
        let mut t = self.write();
        let sub = t
            .subscriptions
            .values_mut()
            .find(|s| s.user_id == user_id && s.status == SubscriptionStatus::Active)
            .ok_or_else(no_active)?;
        sub.status = SubscriptionStatus::Cancelled;
        let sub = sub.clone();
        if let Some(user) = t.users.get_mut(&user_id) {
            user.subscription_status = Some(SubscriptionStatus::Cancelled);
        }
        info!(target: "store", user_id, subscription_id = sub.id, "subscription cancelled");
        Ok(sub)
    }

    /// Reactivate the user's latest subscription for a fresh period, optionally
    /// switching plans. The period restarts at `now`.
    pub fn renew_subscription(&self, user_id: i64, plan: Option<Plan>, now: DateTime<Utc>) -> AppResult<Subscription> {
        self.expire_lapsed(user_id, now);
        let mut t = self.write();
        let sub = t
            .subscriptions
            .values_mut()
            .rev()
            .find(|s| s.user_id == user_id)
            .ok_or_else(|| AppError::not_found("subscription_not_found", "No subscription found for this user"))?;
        if let Some(plan) = plan {
            sub.plan = plan;
        }
        sub.status = SubscriptionStatus::Active;
        sub.start_date = now;
        sub.end_date = now + sub.plan.period();
        let sub = sub.clone();
        if let Some(user) = t.users.get_mut(&user_id) {
            user.role = Role::Organizer;
            user.subscription_status = Some(SubscriptionStatus::Active);
        }
        info!(target: "store", user_id, subscription_id = sub.id, plan = ?sub.plan, "subscription renewed");
        Ok(sub)
    }

    pub fn subscriptions_for(&self, user_id: i64) -> Vec<Subscription> {
        self.read().subscriptions.values().filter(|s| s.user_id == user_id).cloned().collect()
    }

    // Active subscriptions past their end date become expired.
    fn expire_lapsed(&self, user_id: i64, now: DateTime<Utc>) {
        let mut t = self.write();
        let mut lapsed = false;
        for s in t.subscriptions.values_mut() {
            if s.user_id == user_id && s.status == SubscriptionStatus::Active && s.end_date <= now {
                s.status = SubscriptionStatus::Expired;
                lapsed = true;
            }
        }
        if lapsed {
            if let Some(user) = t.users.get_mut(&user_id) {
                user.subscription_status = Some(SubscriptionStatus::Expired);
            }
        }
    }
}
