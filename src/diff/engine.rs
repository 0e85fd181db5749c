//! Recursive structural comparison over JSON values.
//!
//! [`DiffEngine::compare`] walks two [`serde_json::Value`] trees and
//! classifies every field in the union of both sides' keys. The value
//! space is a closed tagged union, so the walk pattern-matches
//! exhaustively rather than inspecting runtime types. Inputs are
//! JSON-derived and acyclic, so no cycle detection is needed.

use std::collections::HashSet;

use serde_json::Value;

use super::report::{DifferenceKind, DiffReport};

/// Pure structural diff engine with a configurable ignore-list.
///
/// Ignored names (transport and correlation metadata) are excluded from
/// the comparison entirely at every recursion level: they contribute to
/// no count and appear in no entry set.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    ignored: HashSet<String>,
}

impl DiffEngine {
    /// Creates an engine ignoring the given field names
    /// (case-insensitive).
    #[must_use]
    pub fn new<I, S>(ignored: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            ignored: ignored
                .into_iter()
                .map(|f| f.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    /// Compares two values, reporting every field under `base_path`.
    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value, base_path: &str) -> DiffReport {
        let mut report = DiffReport::new();
        self.compare_into(left, right, base_path, &mut report);
        report
    }

    fn is_ignored(&self, key: &str) -> bool {
        self.ignored.contains(&key.to_ascii_lowercase())
    }

    fn compare_into(&self, left: &Value, right: &Value, path: &str, report: &mut DiffReport) {
        match (left, right) {
            (Value::Object(left_map), Value::Object(right_map)) => {
                for (key, left_value) in left_map {
                    if self.is_ignored(key) {
                        continue;
                    }
                    let child_path = join_path(path, key);
                    match right_map.get(key) {
                        Some(right_value) => {
                            self.compare_into(left_value, right_value, &child_path, report);
                        }
                        None => report.push_only_in_left(child_path, left_value.clone()),
                    }
                }
                for (key, right_value) in right_map {
                    if self.is_ignored(key) || left_map.contains_key(key) {
                        continue;
                    }
                    report.push_only_in_right(join_path(path, key), right_value.clone());
                }
            }
            (Value::Array(left_items), Value::Array(right_items)) => {
                self.compare_arrays(left_items, right_items, path, report);
            }
            (Value::Null, Value::Null) => report.push_matching(path.to_string()),
            (Value::Null, other) => report.push_difference(
                path.to_string(),
                DifferenceKind::NullMismatch,
                Value::Null,
                other.clone(),
            ),
            (other, Value::Null) => report.push_difference(
                path.to_string(),
                DifferenceKind::NullMismatch,
                other.clone(),
                Value::Null,
            ),
            (left @ Value::Array(_), right @ Value::Object(_))
            | (left @ Value::Object(_), right @ Value::Array(_)) => report.push_difference(
                path.to_string(),
                DifferenceKind::StructureMismatch,
                left.clone(),
                right.clone(),
            ),
            (left, right)
                if std::mem::discriminant(left) != std::mem::discriminant(right) =>
            {
                report.push_difference(
                    path.to_string(),
                    DifferenceKind::TypeMismatch,
                    left.clone(),
                    right.clone(),
                );
            }
            (left, right) if left == right => report.push_matching(path.to_string()),
            (left, right) => report.push_difference(
                path.to_string(),
                DifferenceKind::ValueMismatch,
                left.clone(),
                right.clone(),
            ),
        }
    }

    /// Positional array comparison: index `i` on the left is compared to
    /// index `i` on the right; extra indices are one-sided.
    fn compare_arrays(
        &self,
        left_items: &[Value],
        right_items: &[Value],
        path: &str,
        report: &mut DiffReport,
    ) {
        let mut right_iter = right_items.iter();
        for (index, left_value) in left_items.iter().enumerate() {
            let child_path = format!("{path}[{index}]");
            match right_iter.next() {
                Some(right_value) => {
                    self.compare_into(left_value, right_value, &child_path, report);
                }
                None => report.push_only_in_left(child_path, left_value.clone()),
            }
        }
        for (offset, right_value) in right_iter.enumerate() {
            let index = left_items.len() + offset;
            report.push_only_in_right(format!("{path}[{index}]"), right_value.clone());
        }
    }
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> DiffEngine {
        DiffEngine::new(Vec::<String>::new())
    }

    #[test]
    fn identical_values_have_no_differences() {
        let value = json!({
            "a": 1,
            "b": {"c": [1, 2, {"d": null}]},
            "e": "text",
        });
        let report = engine().compare(&value, &value, "");
        assert!(report.identical());
        assert_eq!(report.match_percentage(), 100);
        assert_eq!(report.total_fields, report.matching_fields);
    }

    #[test]
    fn nested_mismatch_and_extra_key() {
        // One value mismatch at b.c, one extra key d on the right,
        // three total fields, 33% match.
        let left = json!({"a": 1, "b": {"c": 2}});
        let right = json!({"a": 1, "b": {"c": 3}, "d": 4});
        let report = engine().compare(&left, &right, "");

        assert_eq!(report.total_fields, 3);
        assert_eq!(report.matching_fields, 1);
        assert_eq!(report.match_percentage(), 33);

        assert_eq!(report.differences.len(), 1);
        let Some(diff) = report.differences.first() else {
            panic!("expected one difference");
        };
        assert_eq!(diff.path, "b.c");
        assert_eq!(diff.kind, DifferenceKind::ValueMismatch);

        assert_eq!(report.only_in_right.len(), 1);
        let Some(extra) = report.only_in_right.first() else {
            panic!("expected one extra key");
        };
        assert_eq!(extra.path, "d");
    }

    #[test]
    fn only_in_sets_are_symmetric() {
        let left = json!({"a": 1, "x": true});
        let right = json!({"a": 1, "y": "z"});
        let forward = engine().compare(&left, &right, "");
        let backward = engine().compare(&right, &left, "");

        let forward_left: Vec<&str> =
            forward.only_in_left.iter().map(|f| f.path.as_str()).collect();
        let backward_right: Vec<&str> =
            backward.only_in_right.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(forward_left, backward_right);

        let forward_right: Vec<&str> =
            forward.only_in_right.iter().map(|f| f.path.as_str()).collect();
        let backward_left: Vec<&str> =
            backward.only_in_left.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(forward_right, backward_left);
    }

    #[test]
    fn ignored_keys_are_fully_excluded() {
        let engine = DiffEngine::new(["x-request-id", "date"]);
        let left = json!({"X-Request-Id": "a", "date": "Mon", "amount": 10});
        let right = json!({"x-request-id": "b", "amount": 10});
        let report = engine.compare(&left, &right, "");

        assert_eq!(report.total_fields, 1);
        assert!(report.identical());
        assert!(report.matching.iter().all(|p| p == "amount"));
    }

    #[test]
    fn ignored_keys_are_excluded_at_every_level() {
        let engine = DiffEngine::new(["date"]);
        let left = json!({"outer": {"date": "Mon", "v": 1}});
        let right = json!({"outer": {"date": "Tue", "v": 1}});
        let report = engine.compare(&left, &right, "");
        assert!(report.identical());
        assert_eq!(report.total_fields, 1);
    }

    #[test]
    fn arrays_compare_positionally() {
        let left = json!({"items": [1, 2, 3]});
        let right = json!({"items": [1, 9]});
        let report = engine().compare(&left, &right, "");

        assert_eq!(report.matching_fields, 1);
        assert_eq!(report.differences.len(), 1);
        let Some(diff) = report.differences.first() else {
            panic!("expected one difference");
        };
        assert_eq!(diff.path, "items[1]");

        assert_eq!(report.only_in_left.len(), 1);
        let Some(extra) = report.only_in_left.first() else {
            panic!("expected one left-only entry");
        };
        assert_eq!(extra.path, "items[2]");
        assert_eq!(report.total_fields, 3);
    }

    #[test]
    fn both_null_is_matching() {
        let left = json!({"a": null});
        let right = json!({"a": null});
        let report = engine().compare(&left, &right, "");
        assert!(report.identical());
        assert_eq!(report.matching_fields, 1);
    }

    #[test]
    fn single_null_is_null_mismatch() {
        let left = json!({"a": null});
        let right = json!({"a": 5});
        let report = engine().compare(&left, &right, "");
        let Some(diff) = report.differences.first() else {
            panic!("expected a difference");
        };
        assert_eq!(diff.kind, DifferenceKind::NullMismatch);
    }

    #[test]
    fn differing_types_are_type_mismatch() {
        let left = json!({"a": "5"});
        let right = json!({"a": 5});
        let report = engine().compare(&left, &right, "");
        let Some(diff) = report.differences.first() else {
            panic!("expected a difference");
        };
        assert_eq!(diff.kind, DifferenceKind::TypeMismatch);
    }

    #[test]
    fn array_vs_object_is_structure_mismatch() {
        let left = json!({"a": [1]});
        let right = json!({"a": {"b": 1}});
        let report = engine().compare(&left, &right, "");
        let Some(diff) = report.differences.first() else {
            panic!("expected a difference");
        };
        assert_eq!(diff.kind, DifferenceKind::StructureMismatch);
        assert_eq!(report.total_fields, 1);
    }

    #[test]
    fn child_counts_fold_into_parent() {
        let left = json!({"a": {"b": {"c": 1, "d": 2}}, "e": [true, false]});
        let right = json!({"a": {"b": {"c": 1, "d": 3}}, "e": [true, false]});
        let report = engine().compare(&left, &right, "");
        // Leaves: a.b.c, a.b.d, e[0], e[1]; containers contribute nothing
        // of their own.
        assert_eq!(report.total_fields, 4);
        assert_eq!(report.matching_fields, 3);
        assert_eq!(report.match_percentage(), 75);
    }

    #[test]
    fn base_path_prefixes_all_entries() {
        let left = json!({"c": 2});
        let right = json!({"c": 3});
        let report = engine().compare(&left, &right, "body");
        let Some(diff) = report.differences.first() else {
            panic!("expected a difference");
        };
        assert_eq!(diff.path, "body.c");
    }
}
