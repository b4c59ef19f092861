//! Keyed document and snapshot wire shapes.
//!
//! # Responsibility
//! - Define the store-facing record shape: a key plus a string→value map.
//! - Define the full-collection snapshot delivered to subscribers.
//!
//! # Invariants
//! - A field value is either text or null; nothing else round-trips.
//! - Snapshot document order is the store's iteration order and is the only
//!   ordering subscribers may rely on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One field value inside a document.
///
/// Hosted document stores distinguish "field present with null value" from
/// "field absent"; both must be representable so presence checks can reject
/// the former.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// UTF-8 text payload.
    Text(String),
    /// Explicit null; serialized as JSON `null`.
    Null,
}

impl FieldValue {
    /// Builds a text value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Returns the text payload, or `None` for null.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Null => None,
        }
    }

    /// Returns whether this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Field name → value mapping carried by every document.
pub type DocumentFields = BTreeMap<String, FieldValue>;

/// One stored document: natural key plus its field map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Natural key; unique within the collection.
    pub key: String,
    /// Field payload. Keys are field names.
    pub fields: DocumentFields,
}

impl Document {
    /// Builds a document from a key and field map.
    pub fn new(key: impl Into<String>, fields: DocumentFields) -> Self {
        Self {
            key: key.into(),
            fields,
        }
    }

    /// Returns the text payload of `field`.
    ///
    /// `None` covers both cases the presence check must reject: field absent
    /// and field explicitly null.
    pub fn field_text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }
}

/// Full current contents of the collection, delivered on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    /// Documents in store iteration order.
    pub documents: Vec<Document>,
}

impl CollectionSnapshot {
    /// Builds a snapshot from already-ordered documents.
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Number of documents in the snapshot.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns whether the snapshot carries no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Iterates documents in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{CollectionSnapshot, Document, DocumentFields, FieldValue};

    #[test]
    fn field_value_serializes_text_and_null() {
        let text = serde_json::to_value(FieldValue::text("AB")).expect("text should serialize");
        assert_eq!(text, serde_json::json!("AB"));

        let null = serde_json::to_value(FieldValue::Null).expect("null should serialize");
        assert!(null.is_null());
    }

    #[test]
    fn field_value_deserializes_null_as_null_variant() {
        let value: FieldValue =
            serde_json::from_value(serde_json::Value::Null).expect("null should deserialize");
        assert!(value.is_null());

        let value: FieldValue =
            serde_json::from_value(serde_json::json!("Calgary")).expect("text should deserialize");
        assert_eq!(value.as_text(), Some("Calgary"));
    }

    #[test]
    fn field_text_rejects_absent_and_null_fields() {
        let mut fields = DocumentFields::new();
        fields.insert("name".to_string(), FieldValue::text("X"));
        fields.insert("province".to_string(), FieldValue::Null);
        let doc = Document::new("X", fields);

        assert_eq!(doc.field_text("name"), Some("X"));
        assert_eq!(doc.field_text("province"), None);
        assert_eq!(doc.field_text("country"), None);
    }

    #[test]
    fn empty_snapshot_reports_empty() {
        let snapshot = CollectionSnapshot::default();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.len(), 0);
    }
}
