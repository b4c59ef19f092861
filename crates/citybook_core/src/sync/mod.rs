//! Local-list / store synchronization.
//!
//! # Responsibility
//! - Mirror the store's snapshot stream into an ordered in-memory city list.
//! - Forward user mutation intents to the store without touching local
//!   state.
//!
//! # Invariants
//! - Local state changes only inside the snapshot callback; mutation
//!   requests never apply optimistically.
//! - One live subscription per list instance; attach twice is an error.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod intent;
pub mod synced_list;
pub mod view;

pub use intent::CityIntent;
pub use synced_list::SyncedList;
pub use view::ListView;

pub type SyncResult<T> = Result<T, SyncError>;

/// Subscription lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The list already holds a live subscription.
    AlreadyAttached,
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyAttached => {
                write!(f, "list is already attached to a store subscription")
            }
        }
    }
}

impl Error for SyncError {}
