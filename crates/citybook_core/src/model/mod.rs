//! Domain model for the synchronized city list.
//!
//! # Responsibility
//! - Define the canonical city record and the document/snapshot shapes the
//!   store exchanges with it.
//!
//! # Invariants
//! - A city's identity is its `name`; there is no surrogate id.
//! - Local collections are rebuilt from snapshots, never patched in place.

pub mod city;
pub mod document;
