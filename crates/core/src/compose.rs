//! Section composition.
//!
//! Walks a patient record against a pathology config and produces the ordered tree of
//! non-empty sections that render adapters consume. Presence decisions are final here;
//! adapters never re-derive them.
//!
//! Rules:
//! - sections keep config order and are dropped entirely when nothing in them is present
//! - fields keep config order; absent fields are skipped individually
//! - a section without explicit fields shows the record subtree keyed by its id
//! - composition is deterministic and never mutates its inputs

use crate::format::{format_items, format_value, FieldKind};
use crate::media::{MediaClassifier, MediaItem};
use crate::presence::{is_field_present, is_present};
use crate::record::PatientRecord;
use crate::registry::{
    FieldDescriptor, Layout, MediaSpec, PathologyConfig, PathologyRegistry, SectionConfig,
};
use fiche_types::{PathologyId, SectionId};
use serde::Serialize;
use serde_json::Value;

/// Display value of one entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum EntryValue {
    /// Single formatted value.
    Text(String),
    /// Formatted array items; the adapter decides between a joined line and badges.
    List(Vec<String>),
    /// Media references in record order.
    Media(Vec<MediaItem>),
}

/// One labelled, present value inside a section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Record path the value was read from.
    pub key: String,
    pub label: String,
    pub value: EntryValue,
}

/// A composed section. Always holds at least one entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionNode {
    id: SectionId,
    title: String,
    layout: Layout,
    entries: Vec<Entry>,
}

impl SectionNode {
    /// Creates a section node, or `None` when `entries` is empty.
    pub fn new(
        id: SectionId,
        title: impl Into<String>,
        layout: Layout,
        entries: Vec<Entry>,
    ) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Self {
            id,
            title: title.into(),
            layout,
            entries,
        })
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}

/// Composed sections of one pathology. Always holds at least one section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathologyPanel {
    id: PathologyId,
    title: String,
    sections: Vec<SectionNode>,
}

impl PathologyPanel {
    /// Creates a panel, or `None` when `sections` is empty.
    pub fn new(
        id: PathologyId,
        title: impl Into<String>,
        sections: Vec<SectionNode>,
    ) -> Option<Self> {
        if sections.is_empty() {
            return None;
        }
        Some(Self {
            id,
            title: title.into(),
            sections,
        })
    }

    pub fn id(&self) -> &PathologyId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sections(&self) -> &[SectionNode] {
        &self.sections
    }
}

/// Composes the non-empty sections of `config` for `record`.
///
/// # Arguments
///
/// * `record` - Patient record, read only.
/// * `config` - Pathology config driving section order, labels and types.
///
/// # Returns
///
/// Sections in config order, each with at least one entry.
pub fn compose(record: &PatientRecord, config: &PathologyConfig) -> Vec<SectionNode> {
    config
        .sections()
        .filter_map(|section| {
            let entries = if section.is_implicit() {
                implicit_entries(record, section, config)
            } else {
                explicit_entries(record, section, config)
            };

            let node = SectionNode::new(
                section.id().clone(),
                section.title(),
                section.layout(),
                entries,
            );
            if node.is_none() {
                tracing::debug!(
                    pathology = %config.id(),
                    section = %section.id(),
                    "no present content, dropping section"
                );
            }
            node
        })
        .collect()
}

/// Composes a pathology for a patient, checking membership first.
///
/// Non-member patients and unknown pathology ids yield no sections.
pub fn compose_for_patient(
    record: &PatientRecord,
    registry: &PathologyRegistry,
    pathology_id: &str,
) -> Vec<SectionNode> {
    if !record.has_pathology(pathology_id) {
        tracing::debug!(pathology = pathology_id, "patient is not a member, skipping");
        return Vec::new();
    }

    registry
        .get(pathology_id)
        .map(|config| compose(record, config))
        .unwrap_or_default()
}

/// Composes every pathology the patient is a member of, in registry order.
///
/// Pathologies without any present section are left out.
pub fn compose_patient(
    record: &PatientRecord,
    registry: &PathologyRegistry,
) -> Vec<PathologyPanel> {
    registry
        .pathologies()
        .filter(|config| record.has_pathology(config.id().as_str()))
        .filter_map(|config| {
            PathologyPanel::new(config.id().clone(), config.title(), compose(record, config))
        })
        .collect()
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn explicit_entries(
    record: &PatientRecord,
    section: &SectionConfig,
    config: &PathologyConfig,
) -> Vec<Entry> {
    section
        .fields()
        .iter()
        .filter_map(|path| {
            let descriptor = config.descriptor(path.as_str())?;
            let value = record.field(descriptor).value()?;
            field_entry(record, descriptor, value)
        })
        .collect()
}

fn implicit_entries(
    record: &PatientRecord,
    section: &SectionConfig,
    config: &PathologyConfig,
) -> Vec<Entry> {
    let key = section.id().as_str();
    let Some(subtree) = record.group(key) else {
        return Vec::new();
    };
    if !is_present(subtree) {
        return Vec::new();
    }

    match subtree {
        Value::Object(children) => children
            .iter()
            .filter_map(|(child, value)| child_entry(record, config, key, child, value))
            .collect(),
        Value::Array(_) => vec![Entry {
            key: key.to_string(),
            label: section.title().to_string(),
            value: EntryValue::List(format_items(subtree)),
        }],
        scalar => vec![Entry {
            key: key.to_string(),
            label: section.title().to_string(),
            value: EntryValue::Text(format_value(scalar, FieldKind::infer(scalar))),
        }],
    }
}

// Children of an implicit section use the `<section>.<child>` descriptor when one is
// declared, otherwise the raw key and an inferred kind.
fn child_entry(
    record: &PatientRecord,
    config: &PathologyConfig,
    section_key: &str,
    child: &str,
    value: &Value,
) -> Option<Entry> {
    let path = format!("{section_key}.{child}");

    match config.descriptor(&path) {
        Some(descriptor) => {
            if !is_field_present(value, descriptor) {
                return None;
            }
            field_entry(record, descriptor, value)
        }
        None => {
            if !is_present(value) {
                return None;
            }
            let value = inferred_value(value);
            Some(Entry {
                key: path,
                label: child.to_string(),
                value,
            })
        }
    }
}

fn field_entry(
    record: &PatientRecord,
    descriptor: &FieldDescriptor,
    value: &Value,
) -> Option<Entry> {
    let key = descriptor.key().as_str();

    let value = match (descriptor.media(), value) {
        (Some(media), Value::Array(items)) => {
            EntryValue::Media(media_items(record, key, media, items)?)
        }
        _ => entry_value(key, value, descriptor.kind()),
    };

    Some(Entry {
        key: key.to_string(),
        label: descriptor.label().to_string(),
        value,
    })
}

fn entry_value(key: &str, value: &Value, kind: FieldKind) -> EntryValue {
    if !kind.accepts(value) {
        tracing::warn!(
            field = key,
            declared = %kind,
            "value does not match declared field type, using generic formatting"
        );
    }

    match (kind, value) {
        (FieldKind::Array, Value::Array(_)) => EntryValue::List(format_items(value)),
        _ => EntryValue::Text(format_value(value, kind)),
    }
}

// Undeclared content has no type to disagree with.
fn inferred_value(value: &Value) -> EntryValue {
    match value {
        Value::Array(_) => EntryValue::List(format_items(value)),
        _ => EntryValue::Text(format_value(value, FieldKind::infer(value))),
    }
}

fn media_items(
    record: &PatientRecord,
    key: &str,
    media: &MediaSpec,
    items: &[Value],
) -> Option<Vec<MediaItem>> {
    let videos = media
        .videos
        .as_ref()
        .and_then(|path| record.resolve(path))
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(Value::as_str).collect::<Vec<_>>())
        .unwrap_or_default();
    let classifier = MediaClassifier::new(videos);

    let items: Vec<MediaItem> = items
        .iter()
        .filter_map(|item| match item.as_str() {
            Some(uri) if !uri.trim().is_empty() => Some(classifier.item(uri)),
            _ => {
                tracing::warn!(field = key, "skipping media entry that is not a reference");
                None
            }
        })
        .collect();

    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}
