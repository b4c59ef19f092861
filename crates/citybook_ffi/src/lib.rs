//! Flutter-facing bridge crate for citybook.

pub mod api;
