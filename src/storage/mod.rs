//! In-memory domain store shared by all handlers.
//!
//! Every public method takes the lock for a single operation and releases it
//! before returning; nothing holds a guard across an `.await`.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

pub mod users;
pub mod subscriptions;
pub mod events;

pub use users::{NewUser, User, UserUpdate};
pub use subscriptions::{Plan, Subscription, SubscriptionStatus};
pub use events::{Event, EventInput, Registration, RegistrationView};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) users: BTreeMap<i64, User>,
    pub(crate) subscriptions: BTreeMap<i64, Subscription>,
    pub(crate) events: BTreeMap<i64, Event>,
    pub(crate) registrations: BTreeMap<i64, Registration>,
    seq: Sequences,
}

#[derive(Debug, Default)]
struct Sequences {
    users: i64,
    subscriptions: i64,
    events: i64,
    registrations: i64,
}

fn bump(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl Tables {
    pub(crate) fn next_user_id(&mut self) -> i64 { bump(&mut self.seq.users) }
    pub(crate) fn next_subscription_id(&mut self) -> i64 { bump(&mut self.seq.subscriptions) }
    pub(crate) fn next_event_id(&mut self) -> i64 { bump(&mut self.seq.events) }
    pub(crate) fn next_registration_id(&mut self) -> i64 { bump(&mut self.seq.registrations) }
}

#[derive(Debug, Clone, Default)]
pub struct Store(Arc<RwLock<Tables>>);

impl Store {
    pub fn new() -> Self { Self::default() }

    pub(crate) fn read(&self) -> parking_lot::RwLockReadGuard<'_, Tables> { self.0.read() }
    pub(crate) fn write(&self) -> parking_lot::RwLockWriteGuard<'_, Tables> { self.0.write() }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: usize,
    pub total_pages: usize,
    pub data: Vec<T>,
}

impl<T: Clone> Page<T> {
    /// `page` is 1-based; zero values fall back to the first page of 10.
    pub fn slice<'a, I>(items: I, total: usize, page: usize, limit: usize) -> Self
    where
        I: Iterator<Item = &'a T>,
        T: 'a,
    {
        let limit = if limit == 0 { 10 } else { limit };
        let page = page.max(1);
        let data = items.skip((page - 1).saturating_mul(limit)).take(limit).cloned().collect();
        Self { total, total_pages: total.div_ceil(limit), data }
    }
}
