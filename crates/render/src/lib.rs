//! # Fiche Render
//!
//! Target-specific adapters over composed pathology panels.
//!
//! Both adapters consume the same [`PathologyPanel`] tree produced by `fiche-core` and never
//! re-derive presence:
//! - [`InteractiveAdapter`] builds UI nodes with badges, galleries and a lightbox slot
//! - [`ExportAdapter`] builds paginated document blocks with every media reference resolved
//!
//! [`markdown`] turns an export document into Markdown text.

pub mod export;
pub mod interactive;
pub mod markdown;

pub use export::{AspectRatio, Block, DocNode, ExportAdapter, ExportDocument, MediaWidth};
pub use interactive::{InteractiveAdapter, InteractivePanel, Lightbox, UiField, UiNode, UiValue};
pub use markdown::MarkdownWriter;

use fiche_core::PathologyPanel;

/// A consumer that turns a composed panel into target output.
pub trait RenderAdapter {
    type Output;

    fn render(&self, panel: &PathologyPanel) -> Self::Output;

    /// Renders every panel, keeping panel order.
    fn render_all(&self, panels: &[PathologyPanel]) -> Vec<Self::Output> {
        panels.iter().map(|panel| self.render(panel)).collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use fiche_core::{PathologyPanel, PathologyRegistry, PatientRecord};

    pub const CONFIG: &str = r#"
pathologies:
  - id: ddb
    title: Dilatation des bronches
    sections:
      - id: ddb_diagnostic
        title: Diagnostic
        fields: [ddb_diagnostic.date, ddb_diagnostic.etiologies]
      - id: ddb_symptomes
        title: Symptômes
        layout: grid
        fields: [ddb_symptomes.signes]
      - id: ddb_imagerie
        title: Imagerie
        fields: [ddb_imagerie.medias]
    fields:
      - key: ddb_diagnostic.date
        label: Date du diagnostic
        type: date
      - key: ddb_diagnostic.etiologies
        label: Étiologies
        type: array
      - key: ddb_symptomes.signes
        label: Signes
        type: array
      - key: ddb_imagerie.medias
        label: Examens
        type: array
        media:
          videos: ddb_imagerie.videos
"#;

    pub const RECORD: &str = r##"{
        "pathologies": ["ddb"],
        "ddb_diagnostic": { "date": "2024-03-12", "etiologies": ["post-infectieuse", "idiopathique"] },
        "ddb_symptomes": { "signes": ["toux", "# bronchorrhée"] },
        "ddb_imagerie": {
            "medias": [
                "https://firebasestorage.googleapis.com/v0/b/demo/o/patients%2F42%2Fscanner.png?alt=media",
                "uploads/fibroscopie.mp4"
            ],
            "videos": ["uploads/fibroscopie.mp4"]
        }
    }"##;

    pub fn panel() -> PathologyPanel {
        let registry = PathologyRegistry::from_yaml_str(CONFIG).expect("valid config");
        let record = PatientRecord::from_json_str(RECORD).expect("valid record");
        fiche_core::compose_patient(&record, &registry)
            .into_iter()
            .next()
            .expect("ddb panel")
    }
}
