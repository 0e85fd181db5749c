//! Structural diff engine and its report types.
//!
//! Pure functions over `serde_json::Value`: no state beyond the
//! configured ignore-list, no I/O.

pub mod engine;
pub mod report;

pub use engine::DiffEngine;
pub use report::{DiffReport, DifferenceKind, FieldDifference, FieldPresence};
