// ── Diff engine ──
//
// Field-level comparison between a desired payload and the currently
// stored payload. Normalization happens before every comparison: strings
// are trimmed and inner whitespace collapsed, list fields compare as
// multisets, an absent field equals an explicitly empty one, and nested
// maps recurse field-by-field. Administrative metadata never participates.

use indexmap::IndexMap;
use serde::Serialize;

use crate::payload::{Payload, Value};
use crate::schema::{ADMIN_FIELDS, FieldKind, ObjectType, schema_for};

// ── Diff types ──────────────────────────────────────────────────────

/// One changed field. `old_value` is the stored side, `new_value` the
/// desired side; the missing side of an addition or removal is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Ordered change list plus the derived idempotency verdict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDiff {
    pub changes: Vec<FieldChange>,
    pub identical: bool,
}

impl ConfigDiff {
    fn from_changes(changes: Vec<FieldChange>) -> Self {
        let identical = changes.is_empty();
        Self { changes, identical }
    }

    /// Human-readable one-line-per-field summary.
    pub fn summary(&self) -> String {
        self.changes
            .iter()
            .map(|c| format!("{}: {} -> {}", c.field, c.old_value, c.new_value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Entry point ─────────────────────────────────────────────────────

/// Compare a desired payload against the stored one.
///
/// Fields are visited in desired-payload order, then stored-only fields.
/// Either side may carry fields the other lacks; each surfaces as a
/// change with the missing side rendered empty.
pub fn diff(desired: &Payload, actual: &Payload, object_type: ObjectType) -> ConfigDiff {
    let mut changes = Vec::new();
    diff_maps(desired, actual, object_type, "", &mut changes);
    ConfigDiff::from_changes(changes)
}

fn diff_maps(
    desired: &IndexMap<String, Value>,
    actual: &IndexMap<String, Value>,
    object_type: ObjectType,
    prefix: &str,
    changes: &mut Vec<FieldChange>,
) {
    let empty = Value::Scalar(String::new());

    let visit = |field: &str, changes: &mut Vec<FieldChange>| {
        if ADMIN_FIELDS.contains(&field) {
            return;
        }
        let qualified = if prefix.is_empty() {
            field.to_owned()
        } else {
            format!("{prefix}.{field}")
        };
        let want = desired.get(field).unwrap_or(&empty);
        let have = actual.get(field).unwrap_or(&empty);

        // Nested maps recurse so changes carry fully-qualified names.
        if let (Value::Map(want_map), Value::Map(have_map)) = (want, have) {
            diff_maps(want_map, have_map, object_type, &qualified, changes);
            return;
        }

        if !values_equal(field, want, have, object_type) {
            changes.push(FieldChange {
                field: qualified,
                old_value: render(have),
                new_value: render(want),
            });
        }
    };

    for field in desired.keys() {
        visit(field, changes);
    }
    for field in actual.keys() {
        if !desired.contains_key(field) {
            visit(field, changes);
        }
    }
}

// ── Normalized equality ─────────────────────────────────────────────

fn values_equal(field: &str, want: &Value, have: &Value, object_type: ObjectType) -> bool {
    canonical(field, want, object_type) == canonical(field, have, object_type)
}

/// Canonical comparison form for one value. Compared structurally so
/// element boundaries survive; a joined-string form would let elements
/// containing the separator collide across boundaries.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Canon {
    Scalar(String),
    List(Vec<Canon>),
    Map(Vec<(String, Canon)>),
}

/// A singleton list collapses to its element (the wire format collapses
/// single-member lists), and list elements are sorted when the field has
/// membership semantics, which every list field in the schema tables
/// does, and which unknown list fields default to.
fn canonical(field: &str, value: &Value, object_type: ObjectType) -> Canon {
    match value {
        Value::Scalar(s) => Canon::Scalar(normalize_string(s)),
        // An empty list is as absent as an empty string.
        Value::List(items) if items.is_empty() => Canon::Scalar(String::new()),
        Value::List(items) if items.len() == 1 => canonical(field, &items[0], object_type),
        Value::List(items) => {
            let mut parts: Vec<Canon> = items
                .iter()
                .map(|v| canonical(field, v, object_type))
                .collect();
            if ordered_as_set(field, object_type) {
                parts.sort_unstable();
            }
            Canon::List(parts)
        }
        Value::Map(map) => {
            // Only reached for a map compared against a non-map; key
            // order is irrelevant to equality.
            let mut parts: Vec<(String, Canon)> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonical(field, v, object_type)))
                .collect();
            parts.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            Canon::Map(parts)
        }
    }
}

fn ordered_as_set(field: &str, object_type: ObjectType) -> bool {
    schema_for(object_type)
        .field(field)
        .is_none_or(|spec| spec.kind != FieldKind::List || spec.set_semantics)
}

/// Trim and collapse internal whitespace runs to single spaces.
fn normalize_string(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Display rendering for one side of a change.
fn render(value: &Value) -> String {
    match value {
        Value::Scalar(s) => normalize_string(s),
        Value::List(items) => items
            .iter()
            .map(render)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", render(v)))
            .collect::<Vec<_>>()
            .join(", "),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    use super::*;

    fn payload(fields: &[(&str, Value)]) -> Payload {
        fields
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn diff_against_self_is_identical() {
        let p = payload(&[
            ("network", Value::scalar("10.1.1.0/24")),
            ("tags", Value::list(["prod", "web"])),
        ]);
        let d = diff(&p, &p, ObjectType::Address);
        assert!(d.identical);
        assert!(d.changes.is_empty());
    }

    #[test]
    fn reordered_list_fields_stay_identical() {
        let a = payload(&[("tags", Value::list(["prod", "web", "dmz"]))]);
        let b = payload(&[("tags", Value::list(["dmz", "prod", "web"]))]);
        assert!(diff(&a, &b, ObjectType::Address).identical);
    }

    #[test]
    fn list_multiset_detects_membership_changes() {
        let a = payload(&[("members", Value::list(["web-1", "web-2"]))]);
        let b = payload(&[("members", Value::list(["web-1", "web-3"]))]);
        let d = diff(&a, &b, ObjectType::AddressGroup);
        assert!(!d.identical);
        assert_eq!(d.changes[0].field, "members");
    }

    #[test]
    fn list_elements_with_separators_do_not_collide() {
        // Same flattened text, different element boundaries.
        let a = payload(&[("log-tags", Value::list(["a,b", "c"]))]);
        let b = payload(&[("log-tags", Value::list(["a", "b,c"]))]);
        assert!(!diff(&a, &b, ObjectType::SecurityRule).identical);
    }

    #[test]
    fn whitespace_differences_are_not_changes() {
        let a = payload(&[("description", Value::scalar("  web   tier "))]);
        let b = payload(&[("description", Value::scalar("web tier"))]);
        assert!(diff(&a, &b, ObjectType::Address).identical);
    }

    #[test]
    fn absent_field_equals_empty_string() {
        let a = payload(&[
            ("network", Value::scalar("10.1.1.0/24")),
            ("description", Value::scalar("")),
        ]);
        let b = payload(&[("network", Value::scalar("10.1.1.0/24"))]);
        assert!(diff(&a, &b, ObjectType::Address).identical);
    }

    #[test]
    fn scalar_equals_singleton_list() {
        let a = payload(&[("source", Value::scalar("any"))]);
        let b = payload(&[("source", Value::list(["any"]))]);
        assert!(diff(&a, &b, ObjectType::SecurityRule).identical);
    }

    #[test]
    fn admin_fields_never_cause_changes() {
        let a = payload(&[("network", Value::scalar("10.1.1.0/24"))]);
        let b = payload(&[
            ("network", Value::scalar("10.1.1.0/24")),
            ("@admin", Value::scalar("operator-7")),
            ("@dirty-id", Value::scalar("4711")),
            ("@time", Value::scalar("2025/03/01 10:22:56")),
        ]);
        assert!(diff(&a, &b, ObjectType::Address).identical);
    }

    #[test]
    fn changed_field_reports_old_and_new() {
        let desired = payload(&[("network", Value::scalar("10.1.1.0/25"))]);
        let actual = payload(&[("network", Value::scalar("10.1.1.0/24"))]);
        let d = diff(&desired, &actual, ObjectType::Address);
        assert_eq!(
            d.changes,
            vec![FieldChange {
                field: "network".into(),
                old_value: "10.1.1.0/24".into(),
                new_value: "10.1.1.0/25".into(),
            }]
        );
    }

    #[test]
    fn additions_and_removals_have_empty_sides() {
        let desired = payload(&[
            ("network", Value::scalar("10.1.1.0/24")),
            ("description", Value::scalar("web tier")),
        ]);
        let actual = payload(&[
            ("network", Value::scalar("10.1.1.0/24")),
            ("tags", Value::list(["legacy"])),
        ]);
        let d = diff(&desired, &actual, ObjectType::Address);

        let desc = d.changes.iter().find(|c| c.field == "description").unwrap();
        assert_eq!(desc.old_value, "");
        assert_eq!(desc.new_value, "web tier");

        let tags = d.changes.iter().find(|c| c.field == "tags").unwrap();
        assert_eq!(tags.old_value, "legacy");
        assert_eq!(tags.new_value, "");
    }

    #[test]
    fn nested_maps_recurse_with_qualified_names() {
        let mut profile_a = IndexMap::new();
        profile_a.insert("group".to_owned(), Value::scalar("strict"));
        let mut profile_b = IndexMap::new();
        profile_b.insert("group".to_owned(), Value::scalar("lenient"));

        let desired = payload(&[
            ("action", Value::scalar("allow")),
            ("profile-setting", Value::Map(profile_a)),
        ]);
        let actual = payload(&[
            ("action", Value::scalar("allow")),
            ("profile-setting", Value::Map(profile_b)),
        ]);

        let d = diff(&desired, &actual, ObjectType::SecurityRule);
        assert_eq!(d.changes.len(), 1);
        assert_eq!(d.changes[0].field, "profile-setting.group");
        assert_eq!(d.changes[0].old_value, "lenient");
        assert_eq!(d.changes[0].new_value, "strict");
    }
}
