//! User intents emitted by the presentation layer.

use crate::model::city::City;

/// One user action from the list screen, dispatched to
/// [`SyncedList::apply`](crate::sync::SyncedList::apply).
///
/// Presentation never calls mutation methods directly; it emits intents so
/// it stays testable without a UI harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityIntent {
    /// Add dialog confirmed with new city fields.
    Add { name: String, province: String },
    /// Edit dialog confirmed; `target` is the city as currently listed.
    Edit {
        target: City,
        name: String,
        province: String,
    },
    /// Delete confirmed for a listed city.
    Delete { target: City },
    /// A listed city was tapped to view details.
    Select { target: City },
}
