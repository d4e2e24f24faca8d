//! Markdown output for export documents.
//!
//! Record values are free text entered by clinicians, so every user-provided string is escaped
//! before it is written:
//! - `#` at line start → `\#` (prevents headers)
//! - Triple backticks → `\`\`\`` (prevents code blocks)
//! - Standalone `---`, `***`, `___` → escaped (prevents horizontal rules)
//!
//! Output format:
//! ```markdown
//! # Pathology title
//!
//! ## Section title
//!
//! **Label:** value
//! **Label:** `tag` `tag`
//!
//! ![Label](https://resolved/src)
//!
//! [Label](https://resolved/href)
//! ```

use crate::export::{DocNode, ExportDocument};

/// Writes [`ExportDocument`]s as Markdown.
#[derive(Debug, Clone, Default)]
pub struct MarkdownWriter;

impl MarkdownWriter {
    pub fn new() -> Self {
        Self
    }

    /// Renders one document. Blocks are separated by a blank line.
    pub fn write(&self, document: &ExportDocument) -> String {
        let blocks: Vec<String> = document
            .blocks
            .iter()
            .map(|block| {
                block
                    .nodes
                    .iter()
                    .map(|node| self.node(node))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect();

        let mut output = blocks.join("\n\n");
        output.push('\n');
        output
    }

    /// Renders several documents separated by a horizontal rule.
    pub fn write_all(&self, documents: &[ExportDocument]) -> String {
        documents
            .iter()
            .map(|doc| self.write(doc))
            .collect::<Vec<_>>()
            .join("\n---\n\n")
    }

    fn node(&self, node: &DocNode) -> String {
        match node {
            DocNode::Heading { level, text } => {
                let level = usize::from((*level).clamp(1, 6));
                format!("{} {}", "#".repeat(level), escape_inline(text))
            }
            DocNode::Field { label, value } => {
                format!("**{}:** {}", escape_inline(label), escape_text(value))
            }
            DocNode::Tags { label, tags } => {
                let tags = tags
                    .iter()
                    .map(|tag| format!("`{}`", tag.replace('`', "'")))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("**{}:** {}", escape_inline(label), tags)
            }
            DocNode::Image { label, src, .. } => {
                format!("![{}]({})", escape_link_text(label), escape_destination(src))
            }
            DocNode::VideoLink { label, href } => {
                format!("[{}]({})", escape_link_text(label), escape_destination(href))
            }
        }
    }
}

/// Escapes multi-line user text.
fn escape_text(text: &str) -> String {
    text.lines().map(escape_line).collect::<Vec<_>>().join("\n")
}

fn escape_line(line: &str) -> String {
    let trimmed = line.trim();

    if line.trim_start().starts_with('#') {
        line.replacen('#', r"\#", 1)
    } else if trimmed == "---" || trimmed == "***" || trimmed == "___" {
        format!(r"\{}", trimmed)
    } else {
        line.replace("```", r"\`\`\`")
    }
}

// Headings and labels are written on a single line.
fn escape_inline(text: &str) -> String {
    escape_line(&text.replace(['\r', '\n'], " "))
}

fn escape_link_text(text: &str) -> String {
    escape_inline(text).replace('[', r"\[").replace(']', r"\]")
}

fn escape_destination(url: &str) -> String {
    url.replace(' ', "%20").replace('(', "%28").replace(')', "%29")
}
