//! Presentation seam for the synchronized list.

use crate::model::city::City;

/// Read-side surface the synced list pushes into.
///
/// Implementations render however they like (widget tree, stdout, test
/// recorder); they receive cloned state and hold no ownership of the list.
pub trait ListView: Send + Sync {
    /// Called with the full current sequence whenever local state changed.
    fn render(&self, cities: &[City]);

    /// Called when a select intent resolved to a live entity.
    fn show_details(&self, city: &City);
}
