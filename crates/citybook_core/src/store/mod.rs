//! Document store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the keyed write/delete/subscribe surface the synced list
//!   depends on.
//! - Keep snapshot delivery semantics identical across implementations.
//!
//! # Invariants
//! - Every committed change re-delivers the full collection snapshot to all
//!   listeners; there are no incremental patches.
//! - A new listener receives the current snapshot immediately on subscribe.
//! - Listeners must not mutate the store from inside a callback.

use crate::db::DbError;
use crate::model::document::{CollectionSnapshot, DocumentFields};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

pub mod sqlite;

pub use sqlite::SqliteDocumentStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation and snapshot-delivery errors.
#[derive(Debug)]
pub enum StoreError {
    /// Document keys must be non-empty.
    EmptyKey,
    Db(DbError),
    /// Persisted fields payload could not be decoded.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "document key must not be empty"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted document data: {message}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyKey => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Opaque handle identifying one live snapshot subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Mints a fresh unique handle. Store implementations call this when
    /// registering a listener.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Receiver side of a snapshot subscription.
///
/// `on_snapshot` carries the full collection contents; `on_error` reports a
/// failure building or delivering one snapshot and implies nothing about
/// later deliveries.
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot(&self, snapshot: &CollectionSnapshot);
    fn on_error(&self, error: &StoreError);
}

/// Keyed document collection with push-based snapshot delivery.
pub trait DocumentStore: Send + Sync {
    /// Upserts one document under `key`.
    fn write_document(&self, key: &str, fields: DocumentFields) -> StoreResult<()>;

    /// Deletes the document under `key`. Deleting an absent key succeeds
    /// and publishes no snapshot.
    fn delete_document(&self, key: &str) -> StoreResult<()>;

    /// Returns the current full snapshot in store iteration order.
    fn snapshot(&self) -> StoreResult<CollectionSnapshot>;

    /// Registers a listener and immediately delivers the current snapshot
    /// to it (or an error through `on_error` if the snapshot cannot be
    /// built). Establishment itself never fails.
    fn subscribe(&self, listener: Arc<dyn SnapshotListener>) -> SubscriptionId;

    /// Removes a listener; returns whether one was registered under `id`.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
