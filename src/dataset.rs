//! Golden dataset invariants.
//!
//! Hashing only proves a dataset did not change; these checks keep it in the
//! canonical shape reviewers expect: stable record ordering, a closed set of
//! severities, and reason codes that resolve against the dataset's own
//! `reasonCodes` table.
use crate::canonical::CONTENT_HASH_KEY;
use crate::content_hash::ContentHash;
use serde_json::{Map, Value};
use std::fmt;

/// Allowed `severity` values.
pub const SEVERITIES: [&str; 4] = ["critical", "major", "minor", "info"];

/// One invariant violation, located by JSON pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub location: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = if self.location.is_empty() {
            "/"
        } else {
            &self.location
        };
        write!(f, "{location}: {}", self.message)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SortRule {
    /// Ascending with no repeated keys.
    Strict,
    /// Ascending, repeated keys allowed.
    NonDecreasing,
}

#[derive(Default)]
struct Checker {
    violations: Vec<Violation>,
}

impl Checker {
    fn push(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.violations.push(Violation {
            location: location.into(),
            message: message.into(),
        });
    }
}

/// Check every dataset invariant and return all violations found.
pub fn check_dataset(dataset: &Value) -> Vec<Violation> {
    let mut checker = Checker::default();
    let Some(root) = dataset.as_object() else {
        checker.push("", "dataset must be a JSON object");
        return checker.violations;
    };

    match root.get("version") {
        Some(Value::String(version)) if !version.trim().is_empty() => {}
        _ => checker.push("/version", "version must be a non-empty string"),
    }

    if let Some(stored) = root.get(CONTENT_HASH_KEY) {
        let valid = stored
            .as_str()
            .is_some_and(|text| ContentHash::parse(text).is_ok());
        if !valid {
            checker.push(
                format!("/{CONTENT_HASH_KEY}"),
                format!("contentHash must match sha256:<64 lowercase hex> (got {stored})"),
            );
        }
    }

    let empty = Map::new();
    let reason_codes = match root.get("reasonCodes") {
        Some(Value::Object(codes)) => codes,
        Some(_) => {
            checker.push("/reasonCodes", "reasonCodes must be an object");
            &empty
        }
        None => {
            checker.push("/reasonCodes", "reasonCodes is required");
            &empty
        }
    };

    if let Some(documents) = required_array(&mut checker, root, "documents", "") {
        check_sorted(&mut checker, documents, "id", "/documents", SortRule::Strict);
        for (idx, document) in documents.iter().enumerate() {
            let base = format!("/documents/{idx}");
            let Some(document) = document.as_object() else {
                continue;
            };
            if let Some(fields) = optional_array(&mut checker, document, "validatedFields", &base)
            {
                check_sorted(
                    &mut checker,
                    fields,
                    "ruleId",
                    &format!("{base}/validatedFields"),
                    SortRule::NonDecreasing,
                );
            }
            if let Some(findings) = optional_array(&mut checker, document, "findings", &base) {
                check_sorted(
                    &mut checker,
                    findings,
                    "id",
                    &format!("{base}/findings"),
                    SortRule::Strict,
                );
            }
        }
    }

    if let Some(rules) = required_array(&mut checker, root, "rules", "") {
        check_sorted(&mut checker, rules, "ruleId", "/rules", SortRule::Strict);
    }

    for (key, value) in root {
        if key == "reasonCodes" {
            continue;
        }
        check_values(&mut checker, value, &format!("/{}", escape_pointer(key)), reason_codes);
    }

    checker.violations
}

fn required_array<'a>(
    checker: &mut Checker,
    object: &'a Map<String, Value>,
    key: &str,
    base: &str,
) -> Option<&'a Vec<Value>> {
    match object.get(key) {
        None => {
            checker.push(format!("{base}/{key}"), format!("{key} is required"));
            None
        }
        Some(_) => optional_array(checker, object, key, base),
    }
}

fn optional_array<'a>(
    checker: &mut Checker,
    object: &'a Map<String, Value>,
    key: &str,
    base: &str,
) -> Option<&'a Vec<Value>> {
    match object.get(key)? {
        Value::Array(items) => Some(items),
        _ => {
            checker.push(format!("{base}/{key}"), format!("{key} must be an array"));
            None
        }
    }
}

fn check_sorted(
    checker: &mut Checker,
    items: &[Value],
    key: &str,
    location: &str,
    ordering: SortRule,
) {
    let mut previous: Option<&str> = None;
    for (idx, item) in items.iter().enumerate() {
        let Some(current) = item.get(key).and_then(Value::as_str) else {
            checker.push(
                format!("{location}/{idx}/{key}"),
                format!("{key} must be a string"),
            );
            continue;
        };
        if let Some(prev) = previous {
            if current < prev {
                checker.push(
                    format!("{location}/{idx}/{key}"),
                    format!("not sorted by {key}: {current:?} follows {prev:?}"),
                );
            } else if current == prev && ordering == SortRule::Strict {
                checker.push(
                    format!("{location}/{idx}/{key}"),
                    format!("duplicate {key} {current:?}"),
                );
            }
        }
        previous = Some(current);
    }
}

fn check_values(
    checker: &mut Checker,
    value: &Value,
    location: &str,
    reason_codes: &Map<String, Value>,
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_location = format!("{location}/{}", escape_pointer(key));
                match key.as_str() {
                    "severity" => check_severity(checker, child, &child_location),
                    "reasonCode" => {
                        check_reason_code(checker, child, &child_location, reason_codes)
                    }
                    _ => {}
                }
                check_values(checker, child, &child_location, reason_codes);
            }
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                check_values(checker, item, &format!("{location}/{idx}"), reason_codes);
            }
        }
        _ => {}
    }
}

fn check_severity(checker: &mut Checker, value: &Value, location: &str) {
    let known = value
        .as_str()
        .is_some_and(|severity| SEVERITIES.contains(&severity));
    if !known {
        checker.push(
            location,
            format!(
                "severity must be one of {} (got {value})",
                SEVERITIES.join(", ")
            ),
        );
    }
}

fn check_reason_code(
    checker: &mut Checker,
    value: &Value,
    location: &str,
    reason_codes: &Map<String, Value>,
) {
    match value {
        Value::Null => {}
        Value::String(code) if reason_codes.contains_key(code) => {}
        Value::String(code) => {
            checker.push(location, format!("unknown reasonCode {code:?}"));
        }
        other => checker.push(
            location,
            format!("reasonCode must be a string or null (got {other})"),
        ),
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_dataset() -> Value {
        json!({
            "version": "1.0",
            "documents": [
                {
                    "id": "doc-001",
                    "validatedFields": [
                        {"ruleId": "R001", "status": "pass"},
                        {"ruleId": "R002", "status": "fail", "reasonCode": "MISSING_SIGNATURE"}
                    ],
                    "findings": [
                        {"id": "f-1", "severity": "major", "reasonCode": "MISSING_SIGNATURE"},
                        {"id": "f-2", "severity": "info", "reasonCode": null}
                    ]
                },
                {"id": "doc-002", "validatedFields": [], "findings": []}
            ],
            "rules": [
                {"ruleId": "R001", "severity": "critical"},
                {"ruleId": "R002", "severity": "minor"}
            ],
            "reasonCodes": {"MISSING_SIGNATURE": "Signature block is empty"}
        })
    }

    fn locations(violations: &[Violation]) -> Vec<&str> {
        violations
            .iter()
            .map(|violation| violation.location.as_str())
            .collect()
    }

    #[test]
    fn valid_dataset_has_no_violations() {
        assert_eq!(check_dataset(&valid_dataset()), Vec::new());
    }

    #[test]
    fn detects_unsorted_and_duplicate_records() {
        let mut dataset = valid_dataset();
        dataset["documents"][1]["id"] = json!("doc-000");
        dataset["rules"][1]["ruleId"] = json!("R001");
        let violations = check_dataset(&dataset);
        assert_eq!(locations(&violations), vec!["/documents/1/id", "/rules/1/ruleId"]);
        assert!(violations[0].message.contains("not sorted"));
        assert!(violations[1].message.contains("duplicate"));
    }

    #[test]
    fn detects_unsorted_nested_lists() {
        let mut dataset = valid_dataset();
        dataset["documents"][0]["validatedFields"][0]["ruleId"] = json!("R009");
        dataset["documents"][0]["findings"][1]["id"] = json!("f-0");
        let violations = check_dataset(&dataset);
        assert_eq!(
            locations(&violations),
            vec![
                "/documents/0/validatedFields/1/ruleId",
                "/documents/0/findings/1/id"
            ]
        );
    }

    #[test]
    fn detects_bad_severity_and_unknown_reason_code() {
        let mut dataset = valid_dataset();
        dataset["rules"][0]["severity"] = json!("blocker");
        dataset["documents"][0]["findings"][0]["reasonCode"] = json!("NOPE");
        let violations = check_dataset(&dataset);
        assert_eq!(
            locations(&violations),
            vec![
                "/documents/0/findings/0/reasonCode",
                "/rules/0/severity"
            ]
        );
    }

    #[test]
    fn reports_missing_sections() {
        let violations = check_dataset(&json!({"version": ""}));
        assert_eq!(
            locations(&violations),
            vec!["/version", "/reasonCodes", "/documents", "/rules"]
        );
        assert_eq!(
            check_dataset(&json!([])),
            vec![Violation {
                location: String::new(),
                message: "dataset must be a JSON object".to_string(),
            }]
        );
    }

    #[test]
    fn malformed_stored_hash_is_reported() {
        let mut dataset = valid_dataset();
        dataset["contentHash"] = json!("sha256:xyz");
        assert_eq!(locations(&check_dataset(&dataset)), vec!["/contentHash"]);
    }

    #[test]
    fn pointer_segments_are_escaped() {
        assert_eq!(escape_pointer("a/b~c"), "a~1b~0c");
    }
}
