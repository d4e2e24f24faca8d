//! Export adapter.
//!
//! Maps composed sections to paginated document blocks. Each block is a unit the export engine
//! keeps on one page when `keep_together` is set. Every media item gets its own block, drawn at
//! full width with a fixed aspect ratio, and every media reference is rewritten through the
//! [`MediaResolver`] because the export engine cannot perform relative or authenticated fetches.

use crate::RenderAdapter;
use fiche_core::constants::LIST_DELIMITER;
use fiche_core::{
    CoreConfig, Entry, EntryValue, Layout, MediaItem, MediaKind, MediaResolver, PathologyPanel,
    SectionNode,
};
use serde::Serialize;

/// Width/height ratio applied to every exported image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub const MEDIA: AspectRatio = AspectRatio {
        width: 4,
        height: 3,
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaWidth {
    /// Full available width of the block.
    #[default]
    Full,
}

/// A document node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocNode {
    Heading { level: u8, text: String },
    Field { label: String, value: String },
    Tags { label: String, tags: Vec<String> },
    Image {
        label: String,
        src: String,
        width: MediaWidth,
        aspect_ratio: AspectRatio,
    },
    VideoLink { label: String, href: String },
}

/// A layout block. Blocks with `keep_together` must not be split across pages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    pub keep_together: bool,
    pub nodes: Vec<DocNode>,
}

/// Export rendering of one pathology panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub title: String,
    pub blocks: Vec<Block>,
}

impl ExportDocument {
    /// All nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &DocNode> {
        self.blocks.iter().flat_map(|block| &block.nodes)
    }
}

/// Builds [`ExportDocument`]s with resolved media references.
#[derive(Clone, Debug, Default)]
pub struct ExportAdapter {
    resolver: MediaResolver,
}

impl ExportAdapter {
    pub fn new(resolver: MediaResolver) -> Self {
        Self { resolver }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(MediaResolver::from_config(cfg))
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    fn section_blocks(&self, section: &SectionNode, blocks: &mut Vec<Block>) {
        // Heading and text fields stay together; media blocks follow. A heading with no text
        // fields under it opens the first media block instead.
        let mut current = vec![DocNode::Heading {
            level: 2,
            text: section.title().to_string(),
        }];

        for entry in section.entries() {
            match &entry.value {
                EntryValue::Media(items) => {
                    let heading_only = current
                        .iter()
                        .all(|node| matches!(node, DocNode::Heading { .. }));
                    if !heading_only {
                        flush(&mut current, blocks);
                    }
                    for item in items {
                        let mut nodes = std::mem::take(&mut current);
                        nodes.push(self.media_node(&entry.label, item));
                        blocks.push(Block {
                            keep_together: true,
                            nodes,
                        });
                    }
                }
                _ => current.push(text_node(entry, section.layout())),
            }
        }

        flush(&mut current, blocks);
    }

    fn media_node(&self, label: &str, item: &MediaItem) -> DocNode {
        let resolved = self.resolver.resolve_item(item);
        match resolved.kind {
            MediaKind::Image => DocNode::Image {
                label: label.to_string(),
                src: resolved.uri,
                width: MediaWidth::Full,
                aspect_ratio: AspectRatio::MEDIA,
            },
            MediaKind::Video => DocNode::VideoLink {
                label: label.to_string(),
                href: resolved.uri,
            },
        }
    }
}

impl RenderAdapter for ExportAdapter {
    type Output = ExportDocument;

    fn render(&self, panel: &PathologyPanel) -> ExportDocument {
        let mut blocks = vec![Block {
            keep_together: true,
            nodes: vec![DocNode::Heading {
                level: 1,
                text: panel.title().to_string(),
            }],
        }];

        for section in panel.sections() {
            self.section_blocks(section, &mut blocks);
        }

        ExportDocument {
            title: panel.title().to_string(),
            blocks,
        }
    }
}

fn flush(current: &mut Vec<DocNode>, blocks: &mut Vec<Block>) {
    if current.is_empty() {
        return;
    }
    blocks.push(Block {
        keep_together: true,
        nodes: std::mem::take(current),
    });
}

fn text_node(entry: &Entry, layout: Layout) -> DocNode {
    let label = entry.label.clone();
    match (&entry.value, layout) {
        (EntryValue::List(items), Layout::Grid) => DocNode::Tags {
            label,
            tags: items.clone(),
        },
        (EntryValue::List(items), Layout::List) => DocNode::Field {
            label,
            value: items.join(LIST_DELIMITER),
        },
        (EntryValue::Text(text), _) => DocNode::Field {
            label,
            value: text.clone(),
        },
        // Media entries are split into their own blocks before reaching here.
        (EntryValue::Media(items), _) => DocNode::Field {
            label,
            value: items
                .iter()
                .map(|item| item.uri.as_str())
                .collect::<Vec<_>>()
                .join(LIST_DELIMITER),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use fiche_core::{PathologyId, SectionId};

    fn adapter() -> ExportAdapter {
        ExportAdapter::new(MediaResolver::new("https://app.example"))
    }

    #[test]
    fn resolves_every_media_reference() {
        let doc = adapter().render(&fixtures::panel());

        let media: Vec<_> = doc
            .nodes()
            .filter_map(|node| match node {
                DocNode::Image { src, .. } => Some(src.as_str()),
                DocNode::VideoLink { href, .. } => Some(href.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(
            media,
            vec![
                "https://app.example/api/images/patients/42/scanner.png",
                "https://app.example/uploads/fibroscopie.mp4",
            ]
        );
    }

    #[test]
    fn each_media_item_opens_its_own_block() {
        let doc = adapter().render(&fixtures::panel());

        let media_blocks: Vec<_> = doc
            .blocks
            .iter()
            .filter(|block| {
                block
                    .nodes
                    .iter()
                    .any(|n| matches!(n, DocNode::Image { .. } | DocNode::VideoLink { .. }))
            })
            .collect();

        assert_eq!(media_blocks.len(), 2);
        for block in &media_blocks {
            let media_nodes = block
                .nodes
                .iter()
                .filter(|n| matches!(n, DocNode::Image { .. } | DocNode::VideoLink { .. }))
                .count();
            assert_eq!(media_nodes, 1);
            assert!(block.keep_together);
        }

        let image = doc
            .nodes()
            .find(|node| matches!(node, DocNode::Image { .. }))
            .expect("image node");
        assert!(matches!(
            image,
            DocNode::Image {
                width: MediaWidth::Full,
                aspect_ratio: AspectRatio::MEDIA,
                ..
            }
        ));
    }

    #[test]
    fn media_only_section_heading_opens_first_media_block() {
        let doc = adapter().render(&fixtures::panel());
        let heading_at = doc
            .blocks
            .iter()
            .position(|block| {
                block.nodes.first()
                    == Some(&DocNode::Heading {
                        level: 2,
                        text: "Imagerie".into(),
                    })
            })
            .expect("imagerie heading");

        let first = &doc.blocks[heading_at];
        assert_eq!(first.nodes.len(), 2);
        assert!(matches!(first.nodes[1], DocNode::Image { .. }));
        assert!(matches!(
            doc.blocks[heading_at + 1].nodes.as_slice(),
            [DocNode::VideoLink { .. }]
        ));
    }

    #[test]
    fn heading_with_text_fields_keeps_its_own_block() {
        let entries = vec![
            Entry {
                key: "ddb_imagerie.conclusion".into(),
                label: "Conclusion".into(),
                value: EntryValue::Text("Bronchectasies bilatérales".into()),
            },
            Entry {
                key: "ddb_imagerie.medias".into(),
                label: "Examens".into(),
                value: EntryValue::Media(vec![MediaItem {
                    uri: "uploads/scanner.png".into(),
                    kind: MediaKind::Image,
                }]),
            },
        ];
        let section = SectionNode::new(
            SectionId::new("ddb_imagerie").expect("section id"),
            "Imagerie",
            Layout::List,
            entries,
        )
        .expect("section");
        let panel = PathologyPanel::new(
            PathologyId::new("ddb").expect("pathology id"),
            "Dilatation des bronches",
            vec![section],
        )
        .expect("panel");

        let doc = adapter().render(&panel);
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(
            doc.blocks[1].nodes.as_slice(),
            [DocNode::Heading { .. }, DocNode::Field { .. }]
        ));
        assert!(matches!(doc.blocks[2].nodes.as_slice(), [DocNode::Image { .. }]));
    }

    #[test]
    fn arrays_follow_section_layout() {
        let doc = adapter().render(&fixtures::panel());

        assert!(doc.nodes().any(|node| node
            == &DocNode::Field {
                label: "Étiologies".into(),
                value: "post-infectieuse, idiopathique".into(),
            }));
        assert!(doc.nodes().any(|node| node
            == &DocNode::Tags {
                label: "Signes".into(),
                tags: vec!["toux".into(), "# bronchorrhée".into()],
            }));
    }

    #[test]
    fn headings_follow_panel_structure() {
        let doc = adapter().render(&fixtures::panel());
        let headings: Vec<_> = doc
            .nodes()
            .filter_map(|node| match node {
                DocNode::Heading { level, text } => Some((*level, text.as_str())),
                _ => None,
            })
            .collect();

        assert_eq!(
            headings,
            vec![
                (1, "Dilatation des bronches"),
                (2, "Diagnostic"),
                (2, "Symptômes"),
                (2, "Imagerie"),
            ]
        );
        assert!(doc.blocks.iter().all(|block| !block.nodes.is_empty()));
    }

    #[test]
    fn serializes_tagged_nodes() {
        let doc = adapter().render(&fixtures::panel());
        let json = serde_json::to_value(&doc).expect("serialize");
        assert_eq!(json["blocks"][0]["nodes"][0]["type"], "heading");

        let last = json["blocks"]
            .as_array()
            .and_then(|blocks| blocks.last())
            .expect("blocks");
        assert_eq!(last["nodes"][0]["type"], "video_link");
    }
}
