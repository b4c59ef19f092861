//! City domain model.
//!
//! # Responsibility
//! - Define the canonical city record rendered by the list screen.
//! - Map cities to and from the keyed document shape.
//!
//! # Invariants
//! - `name` is the natural key: unique in the collection at any instant.
//! - Renaming never preserves identity; it is delete-old plus insert-new at
//!   the store, and the renamed city is a brand-new document.
//! - A document yields a city only when both required fields are present and
//!   non-null; anything else is dropped, not repaired.

use crate::model::document::{Document, DocumentFields, FieldValue};
use serde::{Deserialize, Serialize};

/// Persisted field name for the city name.
pub const FIELD_NAME: &str = "name";
/// Persisted field name for the province.
pub const FIELD_PROVINCE: &str = "province";

/// Canonical city record.
///
/// Kept as plain owned strings: the record is rebuilt wholesale from every
/// snapshot, so there is nothing to share or intern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// City name; doubles as the document key.
    pub name: String,
    /// Province or state label.
    pub province: String,
}

impl City {
    /// Builds a city record.
    pub fn new(name: impl Into<String>, province: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            province: province.into(),
        }
    }

    /// Returns the natural key this city is stored under.
    pub fn key(&self) -> &str {
        &self.name
    }

    /// Parses a city from a stored document.
    ///
    /// Returns `None` when `name` or `province` is absent or null. That is
    /// the entire validity check; no further schema validation happens.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let name = doc.field_text(FIELD_NAME)?;
        let province = doc.field_text(FIELD_PROVINCE)?;
        Some(Self::new(name, province))
    }

    /// Builds the field map written to the store for this city.
    pub fn to_fields(&self) -> DocumentFields {
        let mut fields = DocumentFields::new();
        fields.insert(FIELD_NAME.to_string(), FieldValue::text(&self.name));
        fields.insert(FIELD_PROVINCE.to_string(), FieldValue::text(&self.province));
        fields
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.name, self.province)
    }
}
