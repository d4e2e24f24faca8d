//! Pathology config registry.
//!
//! This module holds the declarative description of every pathology profile: its ordered
//! sections, the field paths each section shows, and one [`FieldDescriptor`] per field.
//! Configs are produced out-of-band by a generator and are never mutated at runtime.
//!
//! Responsibilities:
//! - Define the domain-level config types consumed by the composer
//! - Define a strict wire model for the generated YAML/JSON
//! - Validate the uniqueness invariants at load time
//! - Provide the process-wide built-in registry
//!
//! Notes:
//! - Lookup by pathology id is O(1) and preserves authored order (`indexmap`)
//! - Unknown pathology ids yield no sections; they are not an error

use crate::format::FieldKind;
use crate::{FicheError, FicheResult};
use fiche_types::{FieldPath, NonEmptyText, PathologyId, SectionId};
use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Generated config shipped with the crate.
const BUILTIN_CONFIG: &str = include_str!("../config/pathologies.yaml");

static BUILTIN: OnceLock<Arc<PathologyRegistry>> = OnceLock::new();

// ============================================================================
// Public domain-level types
// ============================================================================

/// Presentation hint for a section. Has no effect on presence logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    List,
    Grid,
}

/// Media attributes of a field whose value is a sequence of media references.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MediaSpec {
    /// Record path of the declared video list. A reference listed there is a video,
    /// any other reference is an image.
    pub videos: Option<FieldPath>,
}

/// Declarative description of one record field.
///
/// `required` is metadata only: a required field still hides when its value is absent,
/// because encounters are filled in progressively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    key: FieldPath,
    label: NonEmptyText,
    kind: FieldKind,
    required: bool,
    zero_means_absent: bool,
    media: Option<MediaSpec>,
}

impl FieldDescriptor {
    /// Creates a descriptor with no optional flags set.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::InvalidType` if `key` is not a valid field path or `label` is blank.
    pub fn new(key: &str, label: &str, kind: FieldKind) -> FicheResult<Self> {
        Ok(Self {
            key: FieldPath::new(key)?,
            label: NonEmptyText::new(label)?,
            kind,
            required: false,
            zero_means_absent: false,
            media: None,
        })
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_zero_means_absent(mut self, zero_means_absent: bool) -> Self {
        self.zero_means_absent = zero_means_absent;
        self
    }

    pub fn with_media(mut self, media: MediaSpec) -> Self {
        self.media = Some(media);
        self
    }

    pub fn key(&self) -> &FieldPath {
        &self.key
    }

    pub fn label(&self) -> &str {
        self.label.as_str()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn required(&self) -> bool {
        self.required
    }

    pub fn zero_means_absent(&self) -> bool {
        self.zero_means_absent
    }

    pub fn media(&self) -> Option<&MediaSpec> {
        self.media.as_ref()
    }
}

/// A titled, independently prunable group of fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SectionConfig {
    id: SectionId,
    title: NonEmptyText,
    fields: Vec<FieldPath>,
    layout: Layout,
}

impl SectionConfig {
    /// Creates a section config.
    ///
    /// An empty `fields` list means the section content is the record subtree keyed by
    /// the section id itself.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::InvalidType` if the id, title or any field path is invalid.
    pub fn new(id: &str, title: &str, fields: &[&str], layout: Layout) -> FicheResult<Self> {
        let fields = fields
            .iter()
            .map(FieldPath::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: SectionId::new(id)?,
            title: NonEmptyText::new(title)?,
            fields,
            layout,
        })
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn fields(&self) -> &[FieldPath] {
        &self.fields
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns `true` when the section has no explicit field list.
    pub fn is_implicit(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ordered sections and field descriptors of one pathology profile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathologyConfig {
    id: PathologyId,
    title: NonEmptyText,
    sections: IndexMap<SectionId, SectionConfig>,
    fields: IndexMap<FieldPath, FieldDescriptor>,
}

impl PathologyConfig {
    /// Builds a pathology config and validates its invariants.
    ///
    /// # Arguments
    ///
    /// * `id` - Pathology identifier used for membership checks and lookup.
    /// * `title` - Display title of the profile.
    /// * `sections` - Sections in display order.
    /// * `fields` - Field descriptors; may include descriptors for children of implicit
    ///   sections, keyed `<section id>.<child>`.
    ///
    /// # Errors
    ///
    /// Returns [`FicheError`] if:
    /// - two descriptors share a key,
    /// - a media descriptor is not declared as an array,
    /// - two sections share an id,
    /// - a field path appears in more than one section (or twice in one section),
    /// - a section lists a field path without a descriptor.
    pub fn new(
        id: PathologyId,
        title: NonEmptyText,
        sections: Vec<SectionConfig>,
        fields: Vec<FieldDescriptor>,
    ) -> FicheResult<Self> {
        let mut field_map: IndexMap<FieldPath, FieldDescriptor> = IndexMap::new();
        for descriptor in fields {
            if descriptor.media.is_some() && descriptor.kind != FieldKind::Array {
                return Err(FicheError::MediaFieldNotArray {
                    pathology: id.to_string(),
                    key: descriptor.key.to_string(),
                });
            }
            match field_map.entry(descriptor.key.clone()) {
                Entry::Occupied(_) => {
                    return Err(FicheError::DuplicateFieldDescriptor {
                        pathology: id.to_string(),
                        key: descriptor.key.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(descriptor);
                }
            }
        }

        let mut owners: IndexMap<&FieldPath, &SectionId> = IndexMap::new();
        for section in &sections {
            for path in &section.fields {
                if let Some(first) = owners.insert(path, &section.id) {
                    return Err(FicheError::DuplicateFieldPath {
                        pathology: id.to_string(),
                        path: path.to_string(),
                        first: first.to_string(),
                        second: section.id.to_string(),
                    });
                }
                if !field_map.contains_key(path) {
                    return Err(FicheError::MissingFieldDescriptor {
                        pathology: id.to_string(),
                        section: section.id.to_string(),
                        path: path.to_string(),
                    });
                }
            }
        }

        let mut section_map = IndexMap::new();
        for section in sections {
            match section_map.entry(section.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(FicheError::DuplicateSection {
                        pathology: id.to_string(),
                        section: section.id.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(section);
                }
            }
        }

        Ok(Self {
            id,
            title,
            sections: section_map,
            fields: field_map,
        })
    }

    pub fn id(&self) -> &PathologyId {
        &self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Sections in authored order.
    pub fn sections(&self) -> impl ExactSizeIterator<Item = &SectionConfig> {
        self.sections.values()
    }

    pub fn section(&self, id: &str) -> Option<&SectionConfig> {
        self.sections.get(id)
    }

    /// Field descriptor for `path`, if declared.
    pub fn descriptor(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.get(path)
    }

    /// All field descriptors in authored order.
    pub fn descriptors(&self) -> impl ExactSizeIterator<Item = &FieldDescriptor> {
        self.fields.values()
    }
}

/// Immutable mapping from pathology id to its config.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathologyRegistry {
    pathologies: IndexMap<PathologyId, PathologyConfig>,
}

impl PathologyRegistry {
    /// Builds a registry from configs in display order.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::DuplicatePathology` if two configs share an id.
    pub fn new(configs: Vec<PathologyConfig>) -> FicheResult<Self> {
        let mut pathologies = IndexMap::new();
        for config in configs {
            match pathologies.entry(config.id.clone()) {
                Entry::Occupied(_) => {
                    return Err(FicheError::DuplicatePathology(config.id.to_string()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(config);
                }
            }
        }
        Ok(Self { pathologies })
    }

    /// An empty registry: every lookup yields no sections.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a registry from generated YAML (or JSON) text.
    ///
    /// This uses `serde_path_to_error` to surface the path to the failing field (for example
    /// `pathologies[0].sections[1].layout`) when the text does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::ConfigSchema` for schema mismatches and the validation errors of
    /// [`PathologyConfig::new`] and [`PathologyRegistry::new`].
    pub fn from_yaml_str(text: &str) -> FicheResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(text);

        let wire = match serde_path_to_error::deserialize::<_, RegistryWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(FicheError::ConfigSchema {
                    path,
                    message: source.to_string(),
                });
            }
        };

        wire_to_domain(wire)
    }

    /// Read and parse a generated config file.
    ///
    /// # Errors
    ///
    /// Returns `FicheError::ConfigRead` if the file cannot be read, otherwise the errors of
    /// [`PathologyRegistry::from_yaml_str`].
    pub fn from_path(path: &Path) -> FicheResult<Self> {
        let text = std::fs::read_to_string(path).map_err(FicheError::ConfigRead)?;
        Self::from_yaml_str(&text)
    }

    /// The process-wide registry built from the config shipped with the crate.
    ///
    /// Built on first use and immutable afterwards. An embedded config that fails validation
    /// is logged and replaced by an empty registry.
    pub fn builtin() -> &'static Arc<PathologyRegistry> {
        BUILTIN.get_or_init(|| match Self::from_yaml_str(BUILTIN_CONFIG) {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                tracing::error!("built-in pathology config is invalid: {}", e);
                Arc::new(Self::empty())
            }
        })
    }

    /// Config of a pathology, if known.
    pub fn get(&self, id: &str) -> Option<&PathologyConfig> {
        self.pathologies.get(id)
    }

    /// Sections of a pathology in display order; empty for unknown ids.
    pub fn sections_for(&self, id: &str) -> Vec<&SectionConfig> {
        self.get(id)
            .map(|config| config.sections().collect())
            .unwrap_or_default()
    }

    /// All pathology configs in display order.
    pub fn pathologies(&self) -> impl ExactSizeIterator<Item = &PathologyConfig> {
        self.pathologies.values()
    }

    pub fn len(&self) -> usize {
        self.pathologies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathologies.is_empty()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryWire {
    pathologies: Vec<PathologyWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathologyWire {
    id: PathologyId,
    title: NonEmptyText,
    #[serde(default)]
    sections: Vec<SectionWire>,
    #[serde(default)]
    fields: Vec<FieldWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SectionWire {
    id: SectionId,
    title: NonEmptyText,
    #[serde(default)]
    fields: Vec<FieldPath>,
    #[serde(default)]
    layout: Layout,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldWire {
    key: FieldPath,
    label: NonEmptyText,
    #[serde(rename = "type")]
    kind: FieldKind,
    #[serde(default)]
    required: bool,
    #[serde(default, alias = "zeroMeansAbsent")]
    zero_means_absent: bool,
    #[serde(default)]
    media: Option<MediaWire>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct MediaWire {
    #[serde(default)]
    videos: Option<FieldPath>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: RegistryWire) -> FicheResult<PathologyRegistry> {
    let configs = wire
        .pathologies
        .into_iter()
        .map(|pathology| {
            let sections = pathology
                .sections
                .into_iter()
                .map(|s| SectionConfig {
                    id: s.id,
                    title: s.title,
                    fields: s.fields,
                    layout: s.layout,
                })
                .collect();

            let fields = pathology
                .fields
                .into_iter()
                .map(|f| FieldDescriptor {
                    key: f.key,
                    label: f.label,
                    kind: f.kind,
                    required: f.required,
                    zero_means_absent: f.zero_means_absent,
                    media: f.media.map(|m| MediaSpec { videos: m.videos }),
                })
                .collect();

            PathologyConfig::new(pathology.id, pathology.title, sections, fields)
        })
        .collect::<FicheResult<Vec<_>>>()?;

    PathologyRegistry::new(configs)
}
