//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist keyed documents for one collection in the `documents` table.
//! - Rebuild and fan out the full collection snapshot after every committed
//!   change.
//!
//! # Invariants
//! - Snapshot order is ascending `doc_key`.
//! - Listeners are notified in registration order, after the change has
//!   committed and outside the connection lock.
//! - Snapshot build and fan-out are serialized through one publish gate:
//!   a delivery built from an earlier commit can never land after one
//!   built from a later commit, so listener views never regress.
//! - A row whose fields payload fails to decode is skipped with a warning,
//!   never surfaced as a snapshot error.

use crate::model::document::{CollectionSnapshot, Document, DocumentFields};
use crate::store::{DocumentStore, SnapshotListener, StoreError, StoreResult, SubscriptionId};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Embedded single-collection document store over SQLite.
///
/// The store owns its connection: listener fan-out requires the store itself
/// to be shared (`Arc<dyn DocumentStore>`), so the connection cannot stay
/// borrowed from the caller.
pub struct SqliteDocumentStore {
    collection: String,
    conn: Mutex<Connection>,
    listeners: Mutex<Vec<(SubscriptionId, Arc<dyn SnapshotListener>)>>,
    // Serializes snapshot build + delivery; see the module invariants.
    publish_gate: Mutex<()>,
}

impl SqliteDocumentStore {
    /// Wraps a migrated connection, scoped to one collection name.
    ///
    /// Fails when the `documents` table is absent, which means migrations
    /// did not run on this connection.
    pub fn try_new(conn: Connection, collection: impl Into<String>) -> StoreResult<Self> {
        let probed: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'documents';",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if probed.is_none() {
            return Err(StoreError::InvalidData(
                "documents table missing; connection was not migrated".to_string(),
            ));
        }

        Ok(Self {
            collection: collection.into(),
            conn: Mutex::new(conn),
            listeners: Mutex::new(Vec::new()),
            publish_gate: Mutex::new(()),
        })
    }

    /// Collection name this store is scoped to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Arc<dyn SnapshotListener>)>> {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn build_snapshot(&self, conn: &Connection) -> StoreResult<CollectionSnapshot> {
        let mut stmt = conn.prepare(
            "SELECT doc_key, fields
             FROM documents
             WHERE collection = ?1
             ORDER BY doc_key ASC;",
        )?;

        let rows = stmt.query_map([self.collection.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut documents = Vec::new();
        for row in rows {
            let (key, raw_fields) = row?;
            match serde_json::from_str::<DocumentFields>(&raw_fields) {
                Ok(fields) => documents.push(Document::new(key, fields)),
                Err(err) => {
                    warn!(
                        "event=snapshot_build module=store status=skip collection={} key={key} error_code=fields_decode_failed error={err}",
                        self.collection
                    );
                }
            }
        }

        Ok(CollectionSnapshot::new(documents))
    }

    /// Rebuilds the snapshot and delivers it to every listener.
    ///
    /// Held under the publish gate for the whole build + fan-out: two
    /// committed writes may race to this point, and without the gate the
    /// loser could deliver a snapshot built before the winner's commit,
    /// regressing every listener until the next change. The snapshot is
    /// built inside the gate, so a delivery always reflects at least the
    /// commit that triggered it.
    ///
    /// A snapshot that cannot be built is reported through `on_error` so
    /// subscribers learn their view is stale.
    fn publish(&self) {
        let _gate = self
            .publish_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let built = {
            let conn = self.conn();
            self.build_snapshot(&conn)
        };

        let listeners: Vec<Arc<dyn SnapshotListener>> = self
            .listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        match built {
            Ok(snapshot) => {
                info!(
                    "event=snapshot_publish module=store status=ok collection={} documents={} listeners={}",
                    self.collection,
                    snapshot.len(),
                    listeners.len()
                );
                for listener in &listeners {
                    listener.on_snapshot(&snapshot);
                }
            }
            Err(err) => {
                warn!(
                    "event=snapshot_publish module=store status=error collection={} error={err}",
                    self.collection
                );
                for listener in &listeners {
                    listener.on_error(&err);
                }
            }
        }
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn write_document(&self, key: &str, fields: DocumentFields) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let payload = serde_json::to_string(&fields)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        {
            let conn = self.conn();
            conn.execute(
                "INSERT INTO documents (collection, doc_key, fields)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (collection, doc_key) DO UPDATE SET
                    fields = excluded.fields,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![self.collection.as_str(), key, payload],
            )?;
        }

        info!(
            "event=store_write module=store status=ok collection={} key={key}",
            self.collection
        );
        self.publish();
        Ok(())
    }

    fn delete_document(&self, key: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }

        let deleted = {
            let conn = self.conn();
            conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND doc_key = ?2;",
                params![self.collection.as_str(), key],
            )?
        };

        info!(
            "event=store_delete module=store status=ok collection={} key={key} existed={}",
            self.collection,
            deleted > 0
        );

        // Nothing changed for an absent key, so subscribers see no snapshot.
        if deleted > 0 {
            self.publish();
        }
        Ok(())
    }

    fn snapshot(&self) -> StoreResult<CollectionSnapshot> {
        let conn = self.conn();
        self.build_snapshot(&conn)
    }

    fn subscribe(&self, listener: Arc<dyn SnapshotListener>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.listeners().push((id, Arc::clone(&listener)));
        info!(
            "event=store_subscribe module=store status=ok collection={} subscription={id}",
            self.collection
        );

        // The new listener sees current state without waiting for a change.
        // Delivered under the publish gate so the initial snapshot cannot
        // interleave with an in-flight fan-out.
        {
            let _gate = self
                .publish_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match self.snapshot() {
                Ok(snapshot) => listener.on_snapshot(&snapshot),
                Err(err) => listener.on_error(&err),
            }
        }

        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        let removed = listeners.len() < before;
        info!(
            "event=store_unsubscribe module=store status=ok collection={} subscription={id} removed={removed}",
            self.collection
        );
        removed
    }
}
