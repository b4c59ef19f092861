//! Snapshot-driven city list with forwarded mutations.
//!
//! # Responsibility
//! - Hold the ordered city sequence mirrored from store snapshots.
//! - Forward add/update/delete intents to the store, fire-and-forget.
//!
//! # Invariants
//! - Every snapshot replaces the whole sequence; documents failing the
//!   presence check are dropped, not repaired.
//! - Mutation outcomes are logged and swallowed; the subscription is the
//!   single source of truth and corrects the view on the next change.
//! - Mutations are serialized through one gate so two overlapping renames
//!   cannot interleave their delete/write phases.

use crate::model::city::City;
use crate::store::{DocumentStore, SnapshotListener, StoreError, SubscriptionId};
use crate::sync::view::ListView;
use crate::sync::{CityIntent, SyncError, SyncResult};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::model::document::CollectionSnapshot;

/// City list kept in sync with one store collection.
///
/// Created on screen entry with its store and view injected, attached to
/// start mirroring, detached (or dropped) on screen exit.
pub struct SyncedList {
    store: Arc<dyn DocumentStore>,
    view: Arc<dyn ListView>,
    state: Arc<ListState>,
    subscription: Option<SubscriptionId>,
    mutation_gate: Mutex<()>,
}

/// Shared between the list and its snapshot listener.
struct ListState {
    cities: Mutex<Vec<City>>,
}

impl ListState {
    fn cities(&self) -> MutexGuard<'_, Vec<City>> {
        self.cities.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Store-facing listener: applies snapshots to the shared state and tells
/// the view to refresh. The only place local state is ever mutated.
struct SnapshotSink {
    state: Arc<ListState>,
    view: Arc<dyn ListView>,
}

impl SnapshotListener for SnapshotSink {
    fn on_snapshot(&self, snapshot: &CollectionSnapshot) {
        let total = snapshot.len();
        let rebuilt: Vec<City> = snapshot.iter().filter_map(City::from_document).collect();
        let kept = rebuilt.len();

        // Swap under the lock, render outside it.
        let rendered = {
            let mut cities = self.state.cities();
            *cities = rebuilt;
            cities.clone()
        };

        info!(
            "event=snapshot_apply module=sync status=ok kept={kept} skipped={}",
            total - kept
        );
        self.view.render(&rendered);
    }

    fn on_error(&self, error: &StoreError) {
        // View stays stale until the next successful delivery.
        warn!("event=snapshot_apply module=sync status=error error={error}");
    }
}

impl SyncedList {
    /// Builds a detached list over the injected store and view.
    pub fn new(store: Arc<dyn DocumentStore>, view: Arc<dyn ListView>) -> Self {
        Self {
            store,
            view,
            state: Arc::new(ListState {
                cities: Mutex::new(Vec::new()),
            }),
            subscription: None,
            mutation_gate: Mutex::new(()),
        }
    }

    /// Establishes the long-lived snapshot subscription.
    ///
    /// The store delivers the current snapshot immediately, so the view is
    /// rendered before this returns.
    ///
    /// # Errors
    /// - [`SyncError::AlreadyAttached`] when a subscription is already live;
    ///   attaching again would leak a duplicate listener.
    pub fn attach(&mut self) -> SyncResult<()> {
        if self.subscription.is_some() {
            return Err(SyncError::AlreadyAttached);
        }

        let sink = Arc::new(SnapshotSink {
            state: Arc::clone(&self.state),
            view: Arc::clone(&self.view),
        });
        let id = self.store.subscribe(sink);
        self.subscription = Some(id);
        info!("event=list_attach module=sync status=ok subscription={id}");
        Ok(())
    }

    /// Cancels the live subscription. Idempotent; also runs on drop.
    pub fn detach(&mut self) {
        if let Some(id) = self.subscription.take() {
            let removed = self.store.unsubscribe(id);
            info!("event=list_detach module=sync status=ok subscription={id} removed={removed}");
        }
    }

    /// Returns whether a subscription is currently live.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Cloned current sequence, in snapshot order.
    pub fn entities(&self) -> Vec<City> {
        self.state.cities().clone()
    }

    /// Looks up one city by its natural key.
    pub fn find(&self, name: &str) -> Option<City> {
        self.state
            .cities()
            .iter()
            .find(|city| city.name == name)
            .cloned()
    }

    /// Forwards a write for `city` keyed by its name.
    ///
    /// Local state is not touched; the subsequent snapshot is the sole
    /// source of truth. Failure is logged and swallowed.
    pub fn request_add(&self, city: &City) {
        let _gate = self.gate();
        match self.store.write_document(city.key(), city.to_fields()) {
            Ok(()) => info!("event=mutation_add module=sync status=ok key={}", city.name),
            Err(err) => warn!(
                "event=mutation_add module=sync status=error key={} error={err}",
                city.name
            ),
        }
    }

    /// Renames/edits a city as delete-old then write-new.
    ///
    /// The two phases are a sequential dependency, not a transaction: if
    /// the delete fails the update is abandoned with the old document
    /// intact, and if the delete succeeds but the write fails the store
    /// holds neither document until the user retries. That window is
    /// inherent to the keyed-document model where the name is the key.
    pub fn request_update(&self, old: &City, new_name: &str, new_province: &str) {
        let _gate = self.gate();
        if let Err(err) = self.store.delete_document(old.key()) {
            warn!(
                "event=mutation_update module=sync status=error phase=delete key={} error={err}",
                old.name
            );
            return;
        }

        let replacement = City::new(new_name, new_province);
        match self
            .store
            .write_document(replacement.key(), replacement.to_fields())
        {
            Ok(()) => info!(
                "event=mutation_update module=sync status=ok old_key={} new_key={new_name}",
                old.name
            ),
            Err(err) => warn!(
                "event=mutation_update module=sync status=error phase=write old_key={} new_key={new_name} error={err}",
                old.name
            ),
        }
    }

    /// Forwards a delete keyed by the city's name. Fire-and-forget, like
    /// add.
    pub fn request_delete(&self, city: &City) {
        let _gate = self.gate();
        match self.store.delete_document(city.key()) {
            Ok(()) => info!(
                "event=mutation_delete module=sync status=ok key={}",
                city.name
            ),
            Err(err) => warn!(
                "event=mutation_delete module=sync status=error key={} error={err}",
                city.name
            ),
        }
    }

    /// Dispatches one presentation intent to the matching operation.
    pub fn apply(&self, intent: CityIntent) {
        match intent {
            CityIntent::Add { name, province } => {
                self.request_add(&City::new(name, province));
            }
            CityIntent::Edit {
                target,
                name,
                province,
            } => {
                self.request_update(&target, &name, &province);
            }
            CityIntent::Delete { target } => {
                self.request_delete(&target);
            }
            CityIntent::Select { target } => {
                // Resolve against current state: the tapped row may already
                // have vanished from a later snapshot.
                match self.find(&target.name) {
                    Some(city) => self.view.show_details(&city),
                    None => info!(
                        "event=intent_select module=sync status=miss key={}",
                        target.name
                    ),
                }
            }
        }
    }

    fn gate(&self) -> MutexGuard<'_, ()> {
        self.mutation_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SyncedList {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::SyncedList;
    use crate::model::city::City;
    use crate::model::document::{CollectionSnapshot, Document, DocumentFields};
    use crate::store::{
        DocumentStore, SnapshotListener, StoreError, StoreResult, SubscriptionId,
    };
    use crate::sync::view::ListView;
    use crate::sync::{CityIntent, SyncError};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Write(String),
        Delete(String),
    }

    /// Store double recording the mutation sequence; never publishes.
    #[derive(Default)]
    struct RecordingStore {
        ops: Mutex<Vec<Op>>,
        fail_deletes: Mutex<bool>,
        subscriptions: Mutex<Vec<SubscriptionId>>,
        unsubscribed: Mutex<Vec<SubscriptionId>>,
    }

    impl RecordingStore {
        fn ops(&self) -> Vec<Op> {
            self.ops.lock().unwrap().clone()
        }

        fn fail_deletes(&self) {
            *self.fail_deletes.lock().unwrap() = true;
        }
    }

    impl DocumentStore for RecordingStore {
        fn write_document(&self, key: &str, _fields: DocumentFields) -> StoreResult<()> {
            self.ops.lock().unwrap().push(Op::Write(key.to_string()));
            Ok(())
        }

        fn delete_document(&self, key: &str) -> StoreResult<()> {
            self.ops.lock().unwrap().push(Op::Delete(key.to_string()));
            if *self.fail_deletes.lock().unwrap() {
                return Err(StoreError::EmptyKey);
            }
            Ok(())
        }

        fn snapshot(&self) -> StoreResult<CollectionSnapshot> {
            Ok(CollectionSnapshot::default())
        }

        fn subscribe(&self, listener: Arc<dyn SnapshotListener>) -> SubscriptionId {
            listener.on_snapshot(&CollectionSnapshot::default());
            let id = SubscriptionId::new();
            self.subscriptions.lock().unwrap().push(id);
            id
        }

        fn unsubscribe(&self, id: SubscriptionId) -> bool {
            self.unsubscribed.lock().unwrap().push(id);
            true
        }
    }

    #[derive(Default)]
    struct RecordingView {
        rendered: Mutex<Vec<Vec<City>>>,
        details: Mutex<Vec<City>>,
    }

    impl ListView for RecordingView {
        fn render(&self, cities: &[City]) {
            self.rendered.lock().unwrap().push(cities.to_vec());
        }

        fn show_details(&self, city: &City) {
            self.details.lock().unwrap().push(city.clone());
        }
    }

    fn list_over(
        store: Arc<RecordingStore>,
        view: Arc<RecordingView>,
    ) -> SyncedList {
        SyncedList::new(store, view)
    }

    #[test]
    fn request_add_issues_one_keyed_write() {
        let store = Arc::new(RecordingStore::default());
        let list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.request_add(&City::new("Calgary", "AB"));

        assert_eq!(store.ops(), vec![Op::Write("Calgary".to_string())]);
    }

    #[test]
    fn request_delete_issues_one_keyed_delete() {
        let store = Arc::new(RecordingStore::default());
        let list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.request_delete(&City::new("Calgary", "AB"));

        assert_eq!(store.ops(), vec![Op::Delete("Calgary".to_string())]);
    }

    #[test]
    fn request_update_deletes_old_key_before_writing_new() {
        let store = Arc::new(RecordingStore::default());
        let list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.request_update(&City::new("Calgary", "AB"), "Cowtown", "AB");

        assert_eq!(
            store.ops(),
            vec![
                Op::Delete("Calgary".to_string()),
                Op::Write("Cowtown".to_string()),
            ]
        );
    }

    #[test]
    fn request_update_abandons_write_when_delete_fails() {
        let store = Arc::new(RecordingStore::default());
        store.fail_deletes();
        let list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.request_update(&City::new("Calgary", "AB"), "Cowtown", "AB");

        assert_eq!(store.ops(), vec![Op::Delete("Calgary".to_string())]);
    }

    #[test]
    fn province_only_update_keeps_the_same_key() {
        let store = Arc::new(RecordingStore::default());
        let list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.request_update(&City::new("Calgary", "AB"), "Calgary", "BC");

        assert_eq!(
            store.ops(),
            vec![
                Op::Delete("Calgary".to_string()),
                Op::Write("Calgary".to_string()),
            ]
        );
    }

    #[test]
    fn attach_twice_is_rejected() {
        let store = Arc::new(RecordingStore::default());
        let mut list = list_over(store, Arc::new(RecordingView::default()));

        list.attach().expect("first attach should succeed");
        assert!(list.is_attached());
        assert_eq!(list.attach(), Err(SyncError::AlreadyAttached));
    }

    #[test]
    fn detach_is_idempotent_and_unsubscribes_once() {
        let store = Arc::new(RecordingStore::default());
        let mut list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));

        list.attach().expect("attach should succeed");
        list.detach();
        list.detach();

        assert!(!list.is_attached());
        assert_eq!(store.unsubscribed.lock().unwrap().len(), 1);
    }

    #[test]
    fn drop_cancels_live_subscription() {
        let store = Arc::new(RecordingStore::default());
        {
            let mut list = list_over(Arc::clone(&store), Arc::new(RecordingView::default()));
            list.attach().expect("attach should succeed");
        }
        assert_eq!(store.unsubscribed.lock().unwrap().len(), 1);
    }

    #[test]
    fn mutations_never_touch_local_state() {
        let store = Arc::new(RecordingStore::default());
        let list = list_over(store, Arc::new(RecordingView::default()));

        list.request_add(&City::new("Calgary", "AB"));

        assert!(list.entities().is_empty());
    }

    #[test]
    fn subscription_error_leaves_state_and_view_untouched() {
        let store = Arc::new(RecordingStore::default());
        let view = Arc::new(RecordingView::default());
        let list = list_over(store, Arc::clone(&view));

        let sink = super::SnapshotSink {
            state: Arc::clone(&list.state),
            view: Arc::clone(&list.view),
        };
        sink.on_snapshot(&CollectionSnapshot::new(vec![Document::new(
            "Calgary",
            City::new("Calgary", "AB").to_fields(),
        )]));
        let renders_before = view.rendered.lock().unwrap().len();

        sink.on_error(&StoreError::EmptyKey);

        // View stays stale: same entities, no extra render.
        assert_eq!(list.entities(), vec![City::new("Calgary", "AB")]);
        assert_eq!(view.rendered.lock().unwrap().len(), renders_before);
    }

    #[test]
    fn select_intent_resolves_against_current_state() {
        let store = Arc::new(RecordingStore::default());
        let view = Arc::new(RecordingView::default());
        let list = list_over(store, Arc::clone(&view));

        // Seed state directly through the listener path.
        let snapshot = CollectionSnapshot::new(vec![Document::new(
            "Calgary",
            City::new("Calgary", "AB").to_fields(),
        )]);
        let sink = super::SnapshotSink {
            state: Arc::clone(&list.state),
            view: Arc::clone(&list.view),
        };
        sink.on_snapshot(&snapshot);

        list.apply(CityIntent::Select {
            target: City::new("Calgary", "stale"),
        });
        assert_eq!(
            view.details.lock().unwrap().as_slice(),
            &[City::new("Calgary", "AB")]
        );

        list.apply(CityIntent::Select {
            target: City::new("Ghost", "??"),
        });
        assert_eq!(view.details.lock().unwrap().len(), 1);
    }
}
