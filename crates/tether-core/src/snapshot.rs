//! Resource listings and the diff between two of them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{CorrelateError, Result};

/// One resource from a listing response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    pub id: String,
    /// The record exactly as the listing returned it (id field included).
    #[serde(default)]
    pub attrs: serde_json::Map<String, serde_json::Value>,
}

impl ResourceRecord {
    pub fn new(id: &str) -> Self {
        let mut attrs = serde_json::Map::new();
        attrs.insert("id".into(), serde_json::Value::String(id.into()));
        Self {
            id: id.to_string(),
            attrs,
        }
    }
}

/// Records captured from one listing response, in response order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub records: Vec<ResourceRecord>,
}

impl Snapshot {
    pub fn from_ids(ids: &[&str]) -> Self {
        Self {
            records: ids.iter().map(|id| ResourceRecord::new(id)).collect(),
        }
    }

    /// Parse a listing body: a JSON array of objects keyed by `id_field`.
    ///
    /// Anything else fails with [`CorrelateError::ParseFailure`] carrying the
    /// raw body; an HTML login page after a rejected session lands here.
    pub fn parse(body: &str, id_field: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| CorrelateError::parse_failure(e, body))?;
        let items = match value {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(CorrelateError::parse_failure(
                    format!("expected array, got {}", json_kind(&other)),
                    body,
                ))
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            let serde_json::Value::Object(attrs) = item else {
                return Err(CorrelateError::parse_failure(
                    format!("item {i} is not an object"),
                    body,
                ));
            };
            let id = match attrs.get(id_field) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => {
                    return Err(CorrelateError::parse_failure(
                        format!("item {i} has no \"{id_field}\""),
                        body,
                    ))
                }
            };
            records.push(ResourceRecord { id, attrs });
        }
        Ok(Self { records })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ── Diff ──

/// Records in `new` whose id is not in `baseline`, in response order.
pub fn appeared<'a>(baseline: &Snapshot, new: &'a Snapshot) -> Vec<&'a ResourceRecord> {
    let known: HashSet<&str> = baseline.records.iter().map(|r| r.id.as_str()).collect();
    new.records
        .iter()
        .filter(|r| !known.contains(r.id.as_str()))
        .collect()
}

/// True if `id` no longer appears in `new`.
pub fn is_absent(new: &Snapshot, id: &str) -> bool {
    !new.contains(id)
}

/// Pick the record this run spawned.
///
/// With `target_id`, only that id matches and it must be newly appeared.
/// Without one, the first appeared record in response order wins; that is
/// racy when other runs share the listing.
pub fn select_spawned(
    baseline: &Snapshot,
    new: &Snapshot,
    target_id: Option<&str>,
) -> Result<ResourceRecord> {
    let candidates = appeared(baseline, new);
    let found = match target_id {
        Some(target) => candidates.into_iter().find(|r| r.id == target),
        None => {
            if candidates.len() > 1 {
                tracing::warn!(
                    count = candidates.len(),
                    "several new resources appeared; taking the first without a target id"
                );
            }
            candidates.into_iter().next()
        }
    };
    found.cloned().ok_or_else(|| {
        let ids: Vec<&str> = new.records.iter().map(|r| r.id.as_str()).collect();
        CorrelateError::ResourceNotFound(match target_id {
            Some(target) => format!("\"{target}\" did not newly appear in listing {ids:?}"),
            None => format!("no new resource in listing {ids:?}"),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(records: &[&ResourceRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn parse_listing() {
        let body = r#"[
            {"name":"Jupyter","sid":"a1b2","fqsid":"jupyter-ds-a1b2","cpus":1.0},
            {"name":"RStudio","sid":"c3d4","fqsid":"rstudio-c3d4","cpus":2.0}
        ]"#;
        let snap = Snapshot::parse(body, "sid").unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.records[0].id, "a1b2");
        assert_eq!(snap.records[1].attrs["name"], "RStudio");
    }

    #[test]
    fn parse_numeric_ids() {
        let snap = Snapshot::parse(r#"[{"id": 7}, {"id": 8}]"#, "id").unwrap();
        assert!(snap.contains("7"));
        assert!(snap.contains("8"));
    }

    #[test]
    fn parse_empty_listing() {
        assert!(Snapshot::parse("[]", "sid").unwrap().is_empty());
    }

    #[test]
    fn html_body_is_parse_failure_with_body() {
        let body = "<!DOCTYPE html><title>Sign in</title>";
        match Snapshot::parse(body, "sid").unwrap_err() {
            CorrelateError::ParseFailure { body: raw, .. } => assert_eq!(raw, body),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_shapes_are_parse_failures() {
        for body in [r#"{"detail":"Authentication credentials were not provided."}"#, r#"[1]"#, r#"[{"name":"x"}]"#] {
            assert!(
                matches!(Snapshot::parse(body, "sid"), Err(CorrelateError::ParseFailure { .. })),
                "{body}"
            );
        }
    }

    #[test]
    fn appeared_finds_new_ids() {
        let baseline = Snapshot::from_ids(&["A", "B"]);
        let new = Snapshot::from_ids(&["A", "B", "C"]);
        assert_eq!(ids(&appeared(&baseline, &new)), vec!["C"]);
    }

    #[test]
    fn appeared_ignores_order_and_removals() {
        let baseline = Snapshot::from_ids(&["A", "B", "C"]);
        let new = Snapshot::from_ids(&["D", "C", "A"]);
        assert_eq!(ids(&appeared(&baseline, &new)), vec!["D"]);
    }

    #[test]
    fn absent_check() {
        let new = Snapshot::from_ids(&["A", "B"]);
        assert!(is_absent(&new, "C"));
        assert!(!is_absent(&new, "A"));
    }

    #[test]
    fn select_with_target_among_several() {
        let baseline = Snapshot::from_ids(&["A"]);
        let new = Snapshot::from_ids(&["A", "X", "Y"]);
        let rec = select_spawned(&baseline, &new, Some("Y")).unwrap();
        assert_eq!(rec.id, "Y");
    }

    #[test]
    fn select_target_missing_fails() {
        let baseline = Snapshot::from_ids(&["A"]);
        let new = Snapshot::from_ids(&["A", "X"]);
        let err = select_spawned(&baseline, &new, Some("Y")).unwrap_err();
        assert!(matches!(err, CorrelateError::ResourceNotFound(ref m) if m.contains("\"Y\"")));
    }

    #[test]
    fn select_target_already_in_baseline_fails() {
        let baseline = Snapshot::from_ids(&["A"]);
        let new = Snapshot::from_ids(&["A", "B"]);
        assert!(select_spawned(&baseline, &new, Some("A")).is_err());
    }

    #[test]
    fn select_without_target_takes_first_in_response_order() {
        let baseline = Snapshot::from_ids(&["A"]);
        let new = Snapshot::from_ids(&["Z", "A", "M"]);
        assert_eq!(select_spawned(&baseline, &new, None).unwrap().id, "Z");
    }

    #[test]
    fn select_no_change_fails() {
        let baseline = Snapshot::from_ids(&["A"]);
        let new = Snapshot::from_ids(&["A"]);
        assert!(matches!(
            select_spawned(&baseline, &new, None),
            Err(CorrelateError::ResourceNotFound(_))
        ));
    }
}
