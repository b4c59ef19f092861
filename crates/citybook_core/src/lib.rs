//! Core domain logic for citybook.
//! This crate is the single source of truth for the city-list
//! synchronization invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod store;
pub mod sync;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::city::City;
pub use model::document::{CollectionSnapshot, Document, DocumentFields, FieldValue};
pub use store::{
    DocumentStore, SnapshotListener, SqliteDocumentStore, StoreError, StoreResult, SubscriptionId,
};
pub use sync::{CityIntent, ListView, SyncError, SyncResult, SyncedList};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
