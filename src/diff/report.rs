//! Field-level diff report types.

use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

/// Why two values at the same path differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Same type, different value.
    ValueMismatch,
    /// Different runtime types.
    TypeMismatch,
    /// Exactly one side is null.
    NullMismatch,
    /// One side is an array, the other an object.
    StructureMismatch,
}

/// A single field that differs between the two sides.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldDifference {
    /// Dotted path to the field (array elements as `path[i]`).
    pub path: String,
    /// Difference classification.
    pub kind: DifferenceKind,
    /// Left-side value.
    pub left: Value,
    /// Right-side value.
    pub right: Value,
}

/// A field present on only one side.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FieldPresence {
    /// Dotted path to the field.
    pub path: String,
    /// The value on the side that has it.
    pub value: Value,
}

/// Output of structurally comparing two JSON-like values.
///
/// Counts are complete sums over the whole tree: every recursive call
/// contributes its fields additively to the caller.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DiffReport {
    /// Paths whose values match on both sides.
    pub matching: Vec<String>,
    /// Fields present on both sides with differing values.
    pub differences: Vec<FieldDifference>,
    /// Fields present only on the left side.
    pub only_in_left: Vec<FieldPresence>,
    /// Fields present only on the right side.
    pub only_in_right: Vec<FieldPresence>,
    /// Total compared fields (leaves plus one-sided keys).
    pub total_fields: usize,
    /// Fields that matched.
    pub matching_fields: usize,
}

impl DiffReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a matching leaf.
    pub fn push_matching(&mut self, path: String) {
        self.matching.push(path);
        self.total_fields += 1;
        self.matching_fields += 1;
    }

    /// Records a differing leaf.
    pub fn push_difference(&mut self, path: String, kind: DifferenceKind, left: Value, right: Value) {
        self.differences.push(FieldDifference { path, kind, left, right });
        self.total_fields += 1;
    }

    /// Records a field present only on the left.
    pub fn push_only_in_left(&mut self, path: String, value: Value) {
        self.only_in_left.push(FieldPresence { path, value });
        self.total_fields += 1;
    }

    /// Records a field present only on the right.
    pub fn push_only_in_right(&mut self, path: String, value: Value) {
        self.only_in_right.push(FieldPresence { path, value });
        self.total_fields += 1;
    }

    /// Folds a child report's entries and counts into this one.
    pub fn absorb(&mut self, child: Self) {
        self.matching.extend(child.matching);
        self.differences.extend(child.differences);
        self.only_in_left.extend(child.only_in_left);
        self.only_in_right.extend(child.only_in_right);
        self.total_fields += child.total_fields;
        self.matching_fields += child.matching_fields;
    }

    /// Rounded percentage of matching fields. 100 when nothing was
    /// compared (nothing disagreed).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
    pub fn match_percentage(&self) -> u8 {
        if self.total_fields == 0 {
            return 100;
        }
        ((self.matching_fields as f64 / self.total_fields as f64) * 100.0).round() as u8
    }

    /// `true` when there are no differences and no one-sided fields.
    #[must_use]
    pub fn identical(&self) -> bool {
        self.differences.is_empty() && self.only_in_left.is_empty() && self.only_in_right.is_empty()
    }
}
