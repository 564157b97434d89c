//! Word document extraction.
//!
//! `word/document.xml` is read into a flat list of [`Block`]s (headings, paragraphs, lists,
//! tables and breaks) which is then rendered as indented plain text. Text boxes are kept out
//! of the running text and reported with the document's drawing shapes instead.

use crate::error::{PitchtextError, Result};
use crate::extraction::container::{Container, PartSource};
use crate::extraction::grid::compose;
use crate::extraction::normalize::normalize_whitespace;
use crate::extraction::properties::CoreProperties;
use crate::extraction::shapes::{dedup_fragments, parse_shapes};
use crate::types::PositionedFragment;
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;

const WORD_NAMESPACES: [&str; 2] = [
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

static WORD_DRAWING_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^word/drawings/(drawing\d+\.xml|vmlDrawing\d+\.vml)$")
        .expect("Word drawing pattern is valid and should compile")
});

static BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("Blank line pattern is valid and should compile"));

static HEADING_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^heading\s*([1-6])$").expect("Heading style pattern is valid and should compile"));

/// One top-level element of the document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    List(Vec<ListItem>),
    Table(Vec<Vec<String>>),
    LineBreak,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    /// Nesting depth, 0 for top-level items
    pub depth: usize,
    pub text: String,
}

/// Extracted Word text and counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordContent {
    pub content: String,
    pub paragraph_count: usize,
    pub table_count: usize,
    pub shape_count: usize,
    pub properties: CoreProperties,
}

/// Extract a `.docx` package.
///
/// # Errors
///
/// `CorruptContainer` for bytes that are not a ZIP package; `Parsing` when the package has no
/// readable `word/document.xml`.
pub fn extract_docx(bytes: &[u8]) -> Result<WordContent> {
    let mut container = Container::open(bytes)?;
    let properties = CoreProperties::load(&mut container);

    let document_xml = container
        .read_text("word/document.xml")
        .ok_or_else(|| PitchtextError::parsing("Package has no word/document.xml"))?;
    let doc = roxmltree::Document::parse(&document_xml)
        .map_err(|e| PitchtextError::parsing_with_source("Failed to parse word/document.xml", e))?;

    let blocks = parse_blocks(&doc);
    let mut fragments = text_box_fragments(&doc);
    for name in container.part_names() {
        if !WORD_DRAWING_PART.is_match(&name) {
            continue;
        }
        if let Some(xml) = container.read_text(&name) {
            fragments.extend(parse_shapes(&xml, &name));
        }
    }
    let fragments = dedup_fragments(fragments);
    let shape_text = compose(&fragments).pooled_text();

    let mut content = render_blocks(&blocks);
    if !shape_text.is_empty() {
        content.push_str(&format!("\n【Shapes in Word】\n{}\n", shape_text));
    }

    Ok(WordContent {
        content,
        paragraph_count: blocks
            .iter()
            .map(|b| match b {
                Block::Heading { .. } | Block::Paragraph(_) => 1,
                Block::List(items) => items.len(),
                _ => 0,
            })
            .sum(),
        table_count: blocks.iter().filter(|b| matches!(b, Block::Table(_))).count(),
        shape_count: fragments.len(),
        properties,
    })
}

fn is_w(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace().is_some_and(|ns| WORD_NAMESPACES.contains(&ns))
}

fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name && a.namespace().is_some_and(|ns| WORD_NAMESPACES.contains(&ns)))
        .map(|a| a.value())
}

fn w_child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is_w(n, name))
}

/// Read the body into blocks. Consecutive list paragraphs form one list.
pub fn parse_blocks(doc: &roxmltree::Document<'_>) -> Vec<Block> {
    let Some(body) = doc.descendants().find(|n| is_w(n, "body")) else {
        return Vec::new();
    };
    let mut blocks = Vec::new();
    collect_blocks(body, &mut blocks);
    blocks
}

fn collect_blocks(container: Node<'_, '_>, blocks: &mut Vec<Block>) {
    for node in container.children().filter(Node::is_element) {
        if is_w(&node, "p") {
            push_paragraph(node, blocks);
        } else if is_w(&node, "tbl") {
            blocks.push(Block::Table(table_rows(node)));
        } else if is_w(&node, "sdt") {
            if let Some(content) = w_child(node, "sdtContent") {
                collect_blocks(content, blocks);
            }
        }
    }
}

fn push_paragraph(paragraph: Node<'_, '_>, blocks: &mut Vec<Block>) {
    let text = paragraph_text(paragraph);
    let properties = w_child(paragraph, "pPr");

    if text.trim().is_empty() {
        if text.contains('\n') {
            blocks.push(Block::LineBreak);
        }
        return;
    }

    if let Some(level) = properties.and_then(heading_level) {
        blocks.push(Block::Heading { level, text });
        return;
    }

    if let Some(numbering) = properties.and_then(|p| w_child(p, "numPr")) {
        let depth = w_child(numbering, "ilvl")
            .and_then(|n| w_attr(n, "val"))
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let item = ListItem { depth, text };
        match blocks.last_mut() {
            Some(Block::List(items)) => items.push(item),
            _ => blocks.push(Block::List(vec![item])),
        }
        return;
    }

    blocks.push(Block::Paragraph(text));
}

fn heading_level(properties: Node<'_, '_>) -> Option<u8> {
    let style = w_child(properties, "pStyle").and_then(|n| w_attr(n, "val"))?;
    if style.eq_ignore_ascii_case("title") {
        return Some(1);
    }
    HEADING_STYLE
        .captures(style)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Run text of a paragraph. Tabs and breaks are kept; text boxes are skipped.
fn paragraph_text(paragraph: Node<'_, '_>) -> String {
    let mut text = String::new();
    append_run_text(paragraph, &mut text);
    text
}

fn append_run_text(node: Node<'_, '_>, text: &mut String) {
    for child in node.children().filter(Node::is_element) {
        if is_w(&child, "txbxContent") || is_w(&child, "pPr") || is_w(&child, "rPr") {
            continue;
        }
        if is_w(&child, "t") {
            text.push_str(child.text().unwrap_or_default());
        } else if is_w(&child, "tab") {
            text.push('\t');
        } else if is_w(&child, "br") || is_w(&child, "cr") {
            text.push('\n');
        } else if child.tag_name().name() == "Fallback" {
            // Markup-compatibility fallbacks repeat the preceding Choice.
            continue;
        } else {
            append_run_text(child, text);
        }
    }
}

fn table_rows(table: Node<'_, '_>) -> Vec<Vec<String>> {
    table
        .children()
        .filter(|n| is_w(n, "tr"))
        .map(|row| {
            row.children()
                .filter(|n| is_w(n, "tc"))
                .map(|cell| {
                    let paragraphs: Vec<String> = cell
                        .descendants()
                        .filter(|n| is_w(n, "p") && !n.ancestors().any(|a| is_w(&a, "txbxContent")))
                        .map(paragraph_text)
                        .collect();
                    normalize_whitespace(&paragraphs.join(" "))
                })
                .collect()
        })
        .collect()
}

/// Every text box in the document as an unpositioned fragment.
fn text_box_fragments(doc: &roxmltree::Document<'_>) -> Vec<PositionedFragment> {
    doc.descendants()
        .filter(|n| is_w(n, "txbxContent"))
        .map(|content| {
            let paragraphs: Vec<String> = content
                .children()
                .filter(|n| is_w(n, "p"))
                .map(paragraph_text)
                .collect();
            normalize_whitespace(&paragraphs.join(" "))
        })
        .filter(|text| !text.is_empty())
        .map(PositionedFragment::unpositioned)
        .collect()
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Render blocks as layout-preserving text.
pub fn render_blocks(blocks: &[Block]) -> String {
    let mut output = String::new();
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                output.push('\n');
                output.push_str(&indent(usize::from(level.saturating_sub(1))));
                output.push_str(text.trim());
                output.push('\n');
            }
            Block::Paragraph(text) => {
                output.push_str(text);
                output.push('\n');
            }
            Block::List(items) => {
                for item in items {
                    output.push_str(&indent(item.depth + 1));
                    output.push_str("• ");
                    output.push_str(item.text.trim());
                    output.push('\n');
                }
                output.push('\n');
            }
            Block::Table(rows) => {
                for row in rows {
                    let cells: Vec<&str> = row.iter().map(|c| c.trim()).collect();
                    output.push_str(&cells.join(" | "));
                    output.push('\n');
                }
                output.push('\n');
            }
            Block::LineBreak => output.push('\n'),
        }
    }
    BLANK_LINES.replace_all(output.trim(), "\n").into_owned()
}
