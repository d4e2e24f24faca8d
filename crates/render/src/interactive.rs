//! Interactive adapter.
//!
//! Maps composed sections to UI nodes for an on-screen panel. Array entries become badges and
//! media entries become galleries. Media references are kept as stored: the interactive host
//! fetches them itself.
//!
//! The panel carries one piece of mutable state, the [`Lightbox`] selection slot.

use crate::RenderAdapter;
use fiche_core::{Entry, EntryValue, Layout, MediaItem, PathologyPanel, SectionNode};
use serde::Serialize;

/// Display value of a UI field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum UiValue {
    Text(String),
    Badges(Vec<String>),
    Gallery(Vec<MediaItem>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UiField {
    pub key: String,
    pub label: String,
    pub value: UiValue,
}

/// One titled section of the interactive panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UiNode {
    pub id: String,
    pub title: String,
    pub layout: Layout,
    pub fields: Vec<UiField>,
}

/// Full-size overlay for gallery media.
///
/// Holds at most one selected reference. Only references shown in the panel's galleries can
/// be selected; a new selection replaces the previous one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lightbox {
    media: Vec<MediaItem>,
    selected: Option<usize>,
}

impl Lightbox {
    fn new(media: Vec<MediaItem>) -> Self {
        Self {
            media,
            selected: None,
        }
    }

    /// Selects `uri` for full-size display.
    ///
    /// Returns `false` and leaves the selection unchanged if `uri` is not in a gallery.
    pub fn open(&mut self, uri: &str) -> bool {
        match self.media.iter().position(|item| item.uri == uri) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => {
                tracing::debug!(uri, "ignoring lightbox request for unknown media");
                false
            }
        }
    }

    pub fn dismiss(&mut self) {
        self.selected = None;
    }

    /// Currently selected media item, if any.
    pub fn overlay(&self) -> Option<&MediaItem> {
        self.selected.and_then(|index| self.media.get(index))
    }

    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }
}

/// Interactive rendering of one pathology panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractivePanel {
    id: String,
    title: String,
    nodes: Vec<UiNode>,
    #[serde(skip)]
    lightbox: Lightbox,
}

impl InteractivePanel {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn nodes(&self) -> &[UiNode] {
        &self.nodes
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn lightbox_mut(&mut self) -> &mut Lightbox {
        &mut self.lightbox
    }
}

/// Builds [`InteractivePanel`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractiveAdapter;

impl InteractiveAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl RenderAdapter for InteractiveAdapter {
    type Output = InteractivePanel;

    fn render(&self, panel: &PathologyPanel) -> InteractivePanel {
        let nodes: Vec<UiNode> = panel.sections().iter().map(ui_node).collect();

        let media = nodes
            .iter()
            .flat_map(|node| &node.fields)
            .filter_map(|field| match &field.value {
                UiValue::Gallery(items) => Some(items.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect();

        InteractivePanel {
            id: panel.id().to_string(),
            title: panel.title().to_string(),
            nodes,
            lightbox: Lightbox::new(media),
        }
    }
}

fn ui_node(section: &SectionNode) -> UiNode {
    UiNode {
        id: section.id().to_string(),
        title: section.title().to_string(),
        layout: section.layout(),
        fields: section.entries().iter().map(ui_field).collect(),
    }
}

fn ui_field(entry: &Entry) -> UiField {
    let value = match &entry.value {
        EntryValue::Text(text) => UiValue::Text(text.clone()),
        EntryValue::List(items) => UiValue::Badges(items.clone()),
        EntryValue::Media(items) => UiValue::Gallery(items.clone()),
    };

    UiField {
        key: entry.key.clone(),
        label: entry.label.clone(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use fiche_core::MediaKind;

    const SCAN: &str =
        "https://firebasestorage.googleapis.com/v0/b/demo/o/patients%2F42%2Fscanner.png?alt=media";

    #[test]
    fn maps_entries_to_ui_values() {
        let panel = InteractiveAdapter::new().render(&fixtures::panel());
        assert_eq!(panel.title(), "Dilatation des bronches");

        let titles: Vec<_> = panel.nodes().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Diagnostic", "Symptômes", "Imagerie"]);

        let diagnostic = &panel.nodes()[0];
        assert_eq!(diagnostic.fields[0].value, UiValue::Text("2024-03-12".into()));
        assert_eq!(
            diagnostic.fields[1].value,
            UiValue::Badges(vec!["post-infectieuse".into(), "idiopathique".into()])
        );
        assert_eq!(panel.nodes()[1].layout, Layout::Grid);
    }

    #[test]
    fn gallery_keeps_stored_references() {
        let panel = InteractiveAdapter::new().render(&fixtures::panel());
        let UiValue::Gallery(items) = &panel.nodes()[2].fields[0].value else {
            panic!("expected gallery");
        };
        assert_eq!(items[0].uri, SCAN);
        assert_eq!(items[0].kind, MediaKind::Image);
        assert_eq!(items[1].kind, MediaKind::Video);
    }

    #[test]
    fn lightbox_selection_is_single_slot() {
        let mut panel = InteractiveAdapter::new().render(&fixtures::panel());
        assert!(panel.lightbox().overlay().is_none());

        assert!(panel.lightbox_mut().open(SCAN));
        assert!(panel.lightbox_mut().open("uploads/fibroscopie.mp4"));
        let overlay = panel.lightbox().overlay().expect("selected media");
        assert_eq!(overlay.uri, "uploads/fibroscopie.mp4");
        assert_eq!(overlay.kind, MediaKind::Video);

        assert!(!panel.lightbox_mut().open("uploads/other.png"));
        assert_eq!(
            panel.lightbox().overlay().map(|item| item.uri.as_str()),
            Some("uploads/fibroscopie.mp4")
        );

        panel.lightbox_mut().dismiss();
        assert!(!panel.lightbox().is_open());
    }

    #[test]
    fn serializes_without_lightbox_state() {
        let panel = InteractiveAdapter::new().render(&fixtures::panel());
        let json = serde_json::to_value(&panel).expect("serialize");
        assert!(json.get("lightbox").is_none());
        assert_eq!(json["nodes"][1]["fields"][0]["value"]["type"], "badges");
        assert_eq!(json["nodes"][2]["fields"][0]["value"]["value"][1]["kind"], "video");
    }
}
