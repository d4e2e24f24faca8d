//! Patient record access.
//!
//! A patient record is a sparse JSON mapping from namespaced group keys to arbitrary nested
//! values, plus the set of pathologies the patient is a member of. The core only reads it:
//! every lookup is total and a missing or malformed path is simply absent.

use crate::constants::PATHOLOGIES_KEY;
use crate::presence::is_field_present;
use crate::registry::FieldDescriptor;
use crate::{FicheError, FicheResult};
use fiche_types::{FieldPath, PathologyId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Result of looking up a field for display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lookup<'a> {
    /// The field resolved to a meaningfully present value.
    Present(&'a Value),
    /// The path is missing, crosses a non-mapping value, or the value is not present.
    Absent,
}

impl<'a> Lookup<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Lookup::Present(value) => Some(value),
            Lookup::Absent => None,
        }
    }
}

/// Read-only patient record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, rename = "pathologies", deserialize_with = "deserialize_membership")]
    pathologies: BTreeSet<PathologyId>,
    #[serde(flatten)]
    groups: Map<String, Value>,
}

impl PatientRecord {
    /// Creates a record from a membership set and record groups.
    ///
    /// A `pathologies` key inside `groups` is ignored: membership only comes from the
    /// dedicated argument.
    pub fn new(pathologies: BTreeSet<PathologyId>, mut groups: Map<String, Value>) -> Self {
        groups.remove(PATHOLOGIES_KEY);
        Self {
            pathologies,
            groups,
        }
    }

    /// Parses a record from JSON text.
    ///
    /// The text must be a JSON object. Its optional `pathologies` array is the membership set,
    /// every other key is a record group. A `null` membership is empty; a membership that is
    /// not an array, or entries that are not valid ids, are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::RecordNotObject` for non-object JSON and `FicheError::RecordParse`
    /// for malformed JSON.
    pub fn from_json_str(text: &str) -> FicheResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(FicheError::RecordParse)?;
        Self::from_value(value)
    }

    /// Builds a record from an already parsed JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`PatientRecord::from_json_str`].
    pub fn from_value(value: Value) -> FicheResult<Self> {
        if !value.is_object() {
            return Err(FicheError::RecordNotObject);
        }
        serde_json::from_value(value).map_err(FicheError::RecordParse)
    }

    /// Pathologies the patient is a member of.
    pub fn pathologies(&self) -> &BTreeSet<PathologyId> {
        &self.pathologies
    }

    /// Returns `true` if the patient carries the given pathology.
    pub fn has_pathology(&self, id: &str) -> bool {
        self.pathologies.contains(id)
    }

    /// Top-level record group, if set.
    pub fn group(&self, key: &str) -> Option<&Value> {
        self.groups.get(key)
    }

    /// All record groups, in record order.
    pub fn groups(&self) -> &Map<String, Value> {
        &self.groups
    }

    /// Resolves `path` to its raw value, without applying presence rules.
    ///
    /// Returns `None` if any segment is missing or an intermediate value is not a mapping.
    pub fn resolve(&self, path: &FieldPath) -> Option<&Value> {
        let mut segments = path.segments();
        let root = self.groups.get(segments.next()?)?;
        resolve_segments(root, segments)
    }

    /// Looks up a declared field and applies the presence rules of its descriptor.
    pub fn field(&self, descriptor: &FieldDescriptor) -> Lookup<'_> {
        match self.resolve(descriptor.key()) {
            Some(value) if is_field_present(value, descriptor) => Lookup::Present(value),
            _ => Lookup::Absent,
        }
    }
}

fn deserialize_membership<'de, D>(deserializer: D) -> Result<BTreeSet<PathologyId>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(BTreeSet::new()),
        Value::Array(items) => items,
        other => {
            tracing::warn!("ignoring pathology membership that is not a list: {}", other);
            return Ok(BTreeSet::new());
        }
    };

    Ok(items
        .iter()
        .filter_map(|item| match item.as_str().map(PathologyId::new) {
            Some(Ok(id)) => Some(id),
            _ => {
                tracing::warn!("ignoring invalid pathology membership entry: {}", item);
                None
            }
        })
        .collect())
}

// Only mappings are traversed; an array or scalar where a further segment is expected
// makes the path absent.
fn resolve_segments<'a, 's>(
    root: &'a Value,
    segments: impl Iterator<Item = &'s str>,
) -> Option<&'a Value> {
    segments.fold(Some(root), |current, segment| match current? {
        Value::Object(map) => map.get(segment),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FieldKind;
    use serde_json::json;

    fn path(p: &str) -> FieldPath {
        FieldPath::new(p).expect("valid path")
    }

    fn sample() -> PatientRecord {
        PatientRecord::from_json_str(
            r#"{
                "pathologies": ["sas", "pnx"],
                "sas_polygraphie": { "iah": 0, "resultats": { "ido": 12 }, "liste": [1, 2] },
                "sas_commentaire": "Patient adressé par son médecin traitant.",
                "pnx_episode": null
            }"#,
        )
        .expect("valid record")
    }

    #[test]
    fn parses_membership_separately_from_groups() {
        let record = sample();
        assert!(record.has_pathology("sas"));
        assert!(record.has_pathology("pnx"));
        assert!(!record.has_pathology("ddb"));
        assert!(record.group("pathologies").is_none());
        assert_eq!(record.groups().len(), 3);
    }

    #[test]
    fn preserves_record_key_order() {
        let record = sample();
        let keys: Vec<_> = record.groups().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["sas_polygraphie", "sas_commentaire", "pnx_episode"]);
    }

    #[test]
    fn membership_defaults_to_empty() {
        let record = PatientRecord::from_json_str(r#"{"sas_symptomes": {}}"#).expect("record");
        assert!(record.pathologies().is_empty());
    }

    #[test]
    fn rejects_non_object_records() {
        let err = PatientRecord::from_json_str("[1, 2]").expect_err("array record");
        assert!(matches!(err, FicheError::RecordNotObject));

        let err = PatientRecord::from_json_str("{").expect_err("malformed json");
        assert!(matches!(err, FicheError::RecordParse(_)));
    }

    #[test]
    fn null_membership_is_empty() {
        let record = PatientRecord::from_json_str(
            r#"{"pathologies": null, "sas_commentaire": "x"}"#,
        )
        .expect("null membership accepted");
        assert!(record.pathologies().is_empty());
        assert_eq!(record.group("sas_commentaire"), Some(&json!("x")));
    }

    #[test]
    fn non_list_membership_is_ignored() {
        let record = PatientRecord::from_json_str(
            r#"{"pathologies": "sas", "sas_commentaire": "x"}"#,
        )
        .expect("scalar membership accepted");
        assert!(!record.has_pathology("sas"));
        assert!(record.group("pathologies").is_none());
    }

    #[test]
    fn invalid_membership_entries_are_skipped() {
        let record = PatientRecord::from_json_str(r#"{"pathologies": [" ", 3, "pnx", null]}"#)
            .expect("record");
        let ids: Vec<_> = record.pathologies().iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["pnx"]);
    }

    #[test]
    fn resolves_nested_paths() {
        let record = sample();
        assert_eq!(record.resolve(&path("sas_polygraphie.iah")), Some(&json!(0)));
        assert_eq!(
            record.resolve(&path("sas_polygraphie.resultats.ido")),
            Some(&json!(12))
        );
        assert!(record.resolve(&path("sas_polygraphie.absent")).is_none());
        assert!(record.resolve(&path("ddb_efr.vems")).is_none());
    }

    #[test]
    fn non_mapping_intermediate_is_absent() {
        let record = sample();
        assert!(record.resolve(&path("sas_commentaire.texte")).is_none());
        assert!(record.resolve(&path("sas_polygraphie.liste.0")).is_none());
        assert!(record.resolve(&path("pnx_episode.date")).is_none());
    }

    #[test]
    fn field_lookup_applies_descriptor_rules() {
        let record = sample();
        let iah = FieldDescriptor::new("sas_polygraphie.iah", "IAH", FieldKind::Number)
            .expect("descriptor");
        assert_eq!(record.field(&iah), Lookup::Present(&json!(0)));

        let iah = iah.with_zero_means_absent(true);
        assert_eq!(record.field(&iah), Lookup::Absent);
        assert!(record.field(&iah).value().is_none());
    }

    #[test]
    fn new_drops_membership_key_from_groups() {
        let mut groups = Map::new();
        groups.insert("pathologies".into(), json!(["sas"]));
        groups.insert("sas_commentaire".into(), json!("note"));
        let record = PatientRecord::new(BTreeSet::new(), groups);
        assert!(!record.has_pathology("sas"));
        assert!(record.group("pathologies").is_none());
    }
}
