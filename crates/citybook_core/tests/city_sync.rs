use citybook_core::db::open_db_in_memory;
use citybook_core::{
    City, CityIntent, DocumentFields, DocumentStore, FieldValue, ListView, SqliteDocumentStore,
    SyncedList,
};
use std::sync::{Arc, Mutex};

/// Keeps the full render history so intermediate states are assertable.
#[derive(Default)]
struct RecordingView {
    rendered: Mutex<Vec<Vec<City>>>,
    details: Mutex<Vec<City>>,
}

impl RecordingView {
    fn renders(&self) -> Vec<Vec<City>> {
        self.rendered.lock().unwrap().clone()
    }
}

impl ListView for RecordingView {
    fn render(&self, cities: &[City]) {
        self.rendered.lock().unwrap().push(cities.to_vec());
    }

    fn show_details(&self, city: &City) {
        self.details.lock().unwrap().push(city.clone());
    }
}

fn city_fields(name: &str, province: &str) -> DocumentFields {
    City::new(name, province).to_fields()
}

fn shared_store() -> Arc<SqliteDocumentStore> {
    let conn = open_db_in_memory().unwrap();
    Arc::new(SqliteDocumentStore::try_new(conn, "cities").unwrap())
}

fn attached_list(
    store: Arc<SqliteDocumentStore>,
    view: Arc<RecordingView>,
) -> SyncedList {
    let mut list = SyncedList::new(store, view);
    list.attach().unwrap();
    list
}

#[test]
fn local_sequence_mirrors_snapshot_in_order() {
    let store = shared_store();
    store
        .write_document("Victoria", city_fields("Victoria", "BC"))
        .unwrap();
    store
        .write_document("Calgary", city_fields("Calgary", "AB"))
        .unwrap();

    let list = attached_list(store, Arc::new(RecordingView::default()));

    assert_eq!(
        list.entities(),
        vec![City::new("Calgary", "AB"), City::new("Victoria", "BC")]
    );
}

#[test]
fn documents_missing_required_fields_are_dropped() {
    let store = shared_store();
    store
        .write_document("Calgary", city_fields("Calgary", "AB"))
        .unwrap();

    let mut partial = DocumentFields::new();
    partial.insert("name".to_string(), FieldValue::text("X"));
    partial.insert("province".to_string(), FieldValue::Null);
    store.write_document("X", partial).unwrap();

    let mut nameless = DocumentFields::new();
    nameless.insert("province".to_string(), FieldValue::text("BC"));
    store.write_document("Y", nameless).unwrap();

    let list = attached_list(store, Arc::new(RecordingView::default()));

    assert_eq!(list.entities(), vec![City::new("Calgary", "AB")]);
}

#[test]
fn identical_snapshots_apply_idempotently() {
    let store = shared_store();
    let view = Arc::new(RecordingView::default());
    let list = attached_list(Arc::clone(&store), Arc::clone(&view));

    store
        .write_document("Calgary", city_fields("Calgary", "AB"))
        .unwrap();
    store
        .write_document("Calgary", city_fields("Calgary", "AB"))
        .unwrap();

    let renders = view.renders();
    assert_eq!(renders.len(), 3, "initial empty render plus two deliveries");
    assert_eq!(renders[1], renders[2]);
    assert_eq!(list.entities(), vec![City::new("Calgary", "AB")]);
}

#[test]
fn add_intent_lands_in_local_state_via_subscription() {
    let store = shared_store();
    let view = Arc::new(RecordingView::default());
    let list = attached_list(store, Arc::clone(&view));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });

    assert_eq!(list.entities(), vec![City::new("Calgary", "AB")]);
    let renders = view.renders();
    assert_eq!(
        renders.last().unwrap().as_slice(),
        &[City::new("Calgary", "AB")]
    );
}

#[test]
fn rename_passes_through_a_deleted_intermediate_state() {
    let store = shared_store();
    let view = Arc::new(RecordingView::default());
    let list = attached_list(store, Arc::clone(&view));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Edit {
        target: City::new("Calgary", "AB"),
        name: "Cowtown".to_string(),
        province: "AB".to_string(),
    });

    let renders = view.renders();
    // attach (empty), add, rename-delete (empty again), rename-write.
    assert_eq!(renders.len(), 4);
    assert!(renders[2].is_empty(), "delete phase empties the collection");
    assert_eq!(renders[3].as_slice(), &[City::new("Cowtown", "AB")]);
    assert_eq!(list.entities(), vec![City::new("Cowtown", "AB")]);
}

#[test]
fn province_only_edit_keeps_key_and_replaces_fields() {
    let store = shared_store();
    let list = attached_list(store, Arc::new(RecordingView::default()));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Edit {
        target: City::new("Calgary", "AB"),
        name: "Calgary".to_string(),
        province: "BC".to_string(),
    });

    assert_eq!(list.entities(), vec![City::new("Calgary", "BC")]);
}

#[test]
fn delete_intent_removes_entity_from_local_state() {
    let store = shared_store();
    let list = attached_list(store, Arc::new(RecordingView::default()));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Delete {
        target: City::new("Calgary", "AB"),
    });

    assert!(list.entities().is_empty());
}

#[test]
fn two_lists_over_one_store_stay_in_sync() {
    let store = shared_store();
    let first = attached_list(Arc::clone(&store), Arc::new(RecordingView::default()));
    let second = attached_list(Arc::clone(&store), Arc::new(RecordingView::default()));

    first.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });

    assert_eq!(first.entities(), second.entities());
    assert_eq!(second.entities(), vec![City::new("Calgary", "AB")]);
}

#[test]
fn detached_list_stops_mirroring() {
    let store = shared_store();
    let mut list = attached_list(Arc::clone(&store), Arc::new(RecordingView::default()));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.detach();

    store
        .write_document("Victoria", city_fields("Victoria", "BC"))
        .unwrap();

    // State freezes at the last delivery before detach.
    assert_eq!(list.entities(), vec![City::new("Calgary", "AB")]);
}

#[test]
fn select_intent_surfaces_current_details() {
    let store = shared_store();
    let view = Arc::new(RecordingView::default());
    let list = attached_list(store, Arc::clone(&view));

    list.apply(CityIntent::Add {
        name: "Calgary".to_string(),
        province: "AB".to_string(),
    });
    list.apply(CityIntent::Select {
        target: City::new("Calgary", "AB"),
    });

    assert_eq!(
        view.details.lock().unwrap().as_slice(),
        &[City::new("Calgary", "AB")]
    );
}
