//! Changeset validation
//!
//! Callers hand over loosely-typed JSON; this module checks its shape in a
//! fixed order and stops at the first violation. The only rewrite performed
//! is folding the `foreignID` / `foreignId` spellings into `foreign_id`.

use feedstream_domain::{Changeset, FeedError, Result};
use serde_json::{Map, Value};

const FOREIGN_ID: &str = "foreign_id";
const FOREIGN_ID_ALIASES: [&str; 2] = ["foreignID", "foreignId"];

/// Validate a list of changesets and convert them to their typed form.
///
/// # Errors
/// Returns `FeedError::Validation` naming the first violation:
/// - the input is not an array
/// - an element is not an object
/// - an element has neither `id` nor both `foreign_id` and `time`, or has both
/// - `set` is present but not an object
/// - `unset` is present but not an array of strings
pub fn validate_changes(changes: Value) -> Result<Vec<Changeset>> {
    let Value::Array(items) = changes else {
        return Err(FeedError::Validation("changes must be an array of changesets".into()));
    };

    items.into_iter().enumerate().map(|(index, item)| validate_change(index, item)).collect()
}

fn validate_change(index: usize, item: Value) -> Result<Changeset> {
    let Value::Object(mut fields) = item else {
        return Err(invalid(index, "changeset must be an object"));
    };

    normalize_foreign_id(&mut fields);

    let has_id = present(&fields, "id");
    let has_foreign = present(&fields, FOREIGN_ID) && present(&fields, "time");
    if !has_id && !has_foreign {
        return Err(invalid(index, "missing id or foreign_id and time"));
    }
    if has_id && has_foreign {
        return Err(invalid(index, "use either id or foreign_id and time, not both"));
    }

    if let Some(set) = fields.get("set").filter(|v| !v.is_null()) {
        if !set.is_object() {
            return Err(invalid(index, "set must be an object"));
        }
    }

    if let Some(unset) = fields.get("unset").filter(|v| !v.is_null()) {
        let all_strings = unset.as_array().is_some_and(|paths| paths.iter().all(Value::is_string));
        if !all_strings {
            return Err(invalid(index, "unset must be an array of strings"));
        }
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| invalid(index, &e.to_string()))
}

fn normalize_foreign_id(fields: &mut Map<String, Value>) {
    for alias in FOREIGN_ID_ALIASES {
        if let Some(value) = fields.remove(alias) {
            fields.entry(FOREIGN_ID).or_insert(value);
        }
    }
}

fn present(fields: &Map<String, Value>, key: &str) -> bool {
    fields.get(key).is_some_and(|v| !v.is_null())
}

fn invalid(index: usize, reason: &str) -> FeedError {
    FeedError::Validation(format!("changeset {index}: {reason}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn accepts_id_with_set() {
        let changes = validate_changes(json!([{"id": "x", "set": {"a": 1}}])).unwrap();
        assert_eq!(changes, vec![Changeset::by_id("x").set("a", json!(1))]);
    }

    #[test]
    fn accepts_foreign_id_with_unset() {
        let changes = validate_changes(json!([{"foreignId": "p", "time": "t", "unset": ["a"]}]))
            .unwrap();
        assert_eq!(changes, vec![Changeset::by_foreign_id("p", "t").unset("a")]);
    }

    #[test]
    fn normalizes_upper_case_alias() {
        let changes = validate_changes(json!([{"foreignID": "p", "time": "t"}])).unwrap();
        assert_eq!(changes[0].foreign_id.as_deref(), Some("p"));
    }

    #[test]
    fn rejects_missing_identification() {
        let err = validate_changes(json!([{}])).unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));

        let no_time = validate_changes(json!([{"foreign_id": "p", "set": {"a": 1}}]));
        assert!(no_time.is_err());
    }

    #[test]
    fn rejects_both_identification_modes() {
        let err = validate_changes(json!([
            {"id": "a"},
            {"id": "x", "foreignID": "p", "time": "t"}
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            FeedError::Validation(
                "changeset 1: use either id or foreign_id and time, not both".into()
            )
        );
    }

    #[test]
    fn rejects_wrong_set_shape() {
        let err = validate_changes(json!([{"id": "x", "set": [1, 2]}])).unwrap_err();
        assert_eq!(err, FeedError::Validation("changeset 0: set must be an object".into()));
    }

    #[test]
    fn rejects_non_string_unset_paths() {
        assert!(validate_changes(json!([{"id": "x", "unset": "a"}])).is_err());
        assert!(validate_changes(json!([{"id": "x", "unset": ["a", 2]}])).is_err());
    }

    #[test]
    fn rejects_non_array_input() {
        let err = validate_changes(json!({"id": "x"})).unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
        assert!(validate_changes(json!("x")).is_err());
    }

    #[test]
    fn reports_first_violation_index() {
        let err =
            validate_changes(json!([{"id": "ok"}, {"id": "x", "set": 1}, {}])).unwrap_err();
        assert_eq!(err, FeedError::Validation("changeset 1: set must be an object".into()));
    }

    #[test]
    fn rejects_scalar_elements() {
        assert!(validate_changes(json!(["x"])).is_err());
    }
}
