//! # Fiche Core
//!
//! Config-driven presence, composition and media resolution for clinical encounter records.
//!
//! This crate contains the pure pipeline shared by every output target:
//! - Presence evaluation and per-type value formatting
//! - The pathology config registry (generated, immutable, loaded once)
//! - Section composition of a patient record against a pathology config
//! - Media reference classification and export-time URL resolution
//!
//! **No rendering concerns**: interactive and export node trees belong in `fiche-render`.
//! **No I/O beyond config loading**: patient records are supplied by the caller and never mutated.

pub mod compose;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod media;
pub mod presence;
pub mod record;
pub mod registry;

pub use compose::{
    compose, compose_for_patient, compose_patient, Entry, EntryValue, PathologyPanel, SectionNode,
};
pub use config::CoreConfig;
pub use error::{FicheError, FicheResult};
pub use format::{format_items, format_value, FieldKind};
pub use media::{MediaItem, MediaKind, MediaResolver};
pub use presence::{is_field_present, is_present};
pub use record::{Lookup, PatientRecord};
pub use registry::{
    FieldDescriptor, Layout, MediaSpec, PathologyConfig, PathologyRegistry, SectionConfig,
};

// Re-export validated primitives so callers need a single dependency.
pub use fiche_types::{FieldPath, NonEmptyText, PathologyId, SectionId, TypesError};

use std::sync::Arc;

/// Profile display operations over one registry and one runtime configuration.
#[derive(Clone, Debug)]
pub struct ProfileService {
    cfg: Arc<CoreConfig>,
    registry: Arc<PathologyRegistry>,
}

impl ProfileService {
    /// Creates a service for `cfg`.
    ///
    /// Uses the generated config file named by `cfg` when set, otherwise the built-in registry.
    ///
    /// # Errors
    ///
    /// Returns a `FicheError` if the configured file cannot be read or fails validation.
    pub fn new(cfg: Arc<CoreConfig>) -> FicheResult<Self> {
        let registry = match cfg.pathology_config_path() {
            Some(path) => Arc::new(PathologyRegistry::from_path(path)?),
            None => PathologyRegistry::builtin().clone(),
        };
        Ok(Self { cfg, registry })
    }

    /// Creates a service over an explicit registry.
    pub fn with_registry(cfg: Arc<CoreConfig>, registry: Arc<PathologyRegistry>) -> Self {
        Self { cfg, registry }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn registry(&self) -> &PathologyRegistry {
        &self.registry
    }

    /// Declared sections of a pathology; empty for unknown ids.
    pub fn sections_for(&self, pathology_id: &str) -> Vec<&SectionConfig> {
        self.registry.sections_for(pathology_id)
    }

    /// Composed sections of one pathology for a patient.
    ///
    /// Returns nothing when the patient is not a member or the pathology is unknown.
    pub fn pathology_sections(
        &self,
        record: &PatientRecord,
        pathology_id: &str,
    ) -> Vec<SectionNode> {
        compose_for_patient(record, &self.registry, pathology_id)
    }

    /// Panels for every pathology the patient is a member of.
    pub fn panels(&self, record: &PatientRecord) -> Vec<PathologyPanel> {
        compose_patient(record, &self.registry)
    }

    /// Single panel for one pathology, if the patient has any content for it.
    pub fn panel(&self, record: &PatientRecord, pathology_id: &str) -> Option<PathologyPanel> {
        let config = self.registry.get(pathology_id)?;
        PathologyPanel::new(
            config.id().clone(),
            config.title(),
            self.pathology_sections(record, pathology_id),
        )
    }

    /// Resolver configured with the export base URL.
    pub fn media_resolver(&self) -> MediaResolver {
        MediaResolver::from_config(&self.cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record() -> PatientRecord {
        PatientRecord::from_json_str(
            r#"{
                "pathologies": ["pnx"],
                "pnx_episode": { "cote": "droit", "recidive": false, "nombre_episodes": 0 },
                "pnx_commentaire": "Premier épisode."
            }"#,
        )
        .expect("valid record")
    }

    #[test]
    fn default_service_uses_builtin_registry() {
        let service = ProfileService::new(Arc::new(CoreConfig::default())).expect("service");
        assert!(!service.sections_for("pnx").is_empty());
        assert!(service.sections_for("not-a-real-id").is_empty());
    }

    #[test]
    fn panel_composes_member_pathology() {
        let service = ProfileService::new(Arc::new(CoreConfig::default())).expect("service");
        let panel = service.panel(&record(), "pnx").expect("pnx panel");
        assert_eq!(panel.title(), "Pneumothorax");

        let ids: Vec<_> = panel.sections().iter().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["pnx_episode", "pnx_commentaire"]);

        let episode = &panel.sections()[0];
        assert_eq!(episode.entries().len(), 1);
        assert_eq!(episode.entries()[0].label, "Côté");

        assert!(service.panel(&record(), "sas").is_none());
        assert_eq!(service.panels(&record()).len(), 1);
    }

    #[test]
    fn service_loads_configured_registry() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(
            b"pathologies:\n  - id: custom\n    title: Custom\n    sections:\n      - id: custom_note\n        title: Note\n",
        )
        .expect("write config");

        let cfg = CoreConfig::new("https://app.example", Some(file.path().to_path_buf()))
            .expect("config");
        let service = ProfileService::new(Arc::new(cfg)).expect("service");
        assert_eq!(service.registry().len(), 1);
        assert_eq!(
            service.media_resolver().resolve("a.png"),
            "https://app.example/a.png"
        );
    }

    #[test]
    fn service_reports_invalid_configured_registry() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"pathologies: 3\n").expect("write config");

        let cfg = CoreConfig::new("https://app.example", Some(file.path().to_path_buf()))
            .expect("config");
        let err = ProfileService::new(Arc::new(cfg)).expect_err("invalid config");
        assert!(matches!(err, FicheError::ConfigSchema { .. }));
    }
}
