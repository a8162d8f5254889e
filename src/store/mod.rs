//! In-memory user records behind a capability trait.
//!
//! The routing layer only ever sees [`UserStore`] — handlers take an
//! `Arc<dyn UserStore>` and never name the concrete type, so swapping the
//! backing implementation is a wiring change, not a handler change.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;

/// A stored user record. Timestamps are Unix epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: u64,
    pub updated_at: u64,
}

/// Input for creating a user. `id` and timestamps are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update: only the provided fields change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// The record-store capability consumed by the API handlers.
pub trait UserStore: Send + Sync {
    /// Validates and stores a new record, returning it with its assigned id.
    fn create(&self, input: NewUser) -> Result<User, Error>;

    /// Returns the record with the given id.
    fn read(&self, id: u64) -> Result<User, Error>;

    /// Applies `patch` to the record with the given id and bumps `updated_at`.
    fn update(&self, id: u64, patch: UserPatch) -> Result<(), Error>;

    /// Removes the record with the given id.
    fn delete(&self, id: u64) -> Result<(), Error>;

    /// Returns all records in insertion order.
    fn list(&self) -> Vec<User>;
}

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    next_id: u64,
}

/// `Vec`-backed [`UserStore`]. Ids are issued from a monotonic counter and
/// never reused, even after deletions.
#[derive(Debug, Default)]
pub struct InMemoryUsers {
    inner: Mutex<Inner>,
}

impl InMemoryUsers {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

impl UserStore for InMemoryUsers {
    fn create(&self, input: NewUser) -> Result<User, Error> {
        if input.name.is_empty() || input.email.is_empty() {
            return Err(Error::invalid_record("User", "name and email are required"));
        }

        let mut inner = self.locked();
        inner.next_id += 1;
        let now = epoch_seconds();
        let user = User {
            id: inner.next_id,
            name: input.name,
            email: input.email,
            created_at: now,
            updated_at: now,
        };
        inner.users.push(user.clone());
        debug!(id = user.id, name = %user.name, "user created");
        Ok(user)
    }

    fn read(&self, id: u64) -> Result<User, Error> {
        self.locked()
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found("user", id))
    }

    fn update(&self, id: u64, patch: UserPatch) -> Result<(), Error> {
        let mut inner = self.locked();
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or_else(|| Error::not_found("user", id))?;

        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        user.updated_at = epoch_seconds();
        debug!(id, "user updated");
        Ok(())
    }

    fn delete(&self, id: u64) -> Result<(), Error> {
        let mut inner = self.locked();
        let index = inner
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or_else(|| Error::not_found("user", id))?;
        inner.users.remove(index);
        debug!(id, "user deleted");
        Ok(())
    }

    fn list(&self) -> Vec<User> {
        self.locked().users.clone()
    }
}
