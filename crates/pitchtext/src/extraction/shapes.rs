//! Shape text from DrawingML and legacy VML drawing parts.

use crate::extraction::normalize::normalize_whitespace;
use crate::types::PositionedFragment;
use ahash::AHashSet;
use roxmltree::Node;

pub const SPREADSHEET_DRAWING_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub const DRAWING_MAIN_NAMESPACE: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const VML_NAMESPACE: &str = "urn:schemas-microsoft-com:vml";

/// Which markup a drawing part uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingKind {
    /// DrawingML (`drawingN.xml`)
    Modern,
    /// VML (`vmlDrawingN.vml`)
    Legacy,
}

impl DrawingKind {
    /// Decided by file extension only.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".vml") {
            DrawingKind::Legacy
        } else {
            DrawingKind::Modern
        }
    }
}

/// Parse one drawing part into positioned text fragments.
///
/// Malformed XML yields an empty list.
pub fn parse_shapes(xml: &str, part_path: &str) -> Vec<PositionedFragment> {
    let doc = match roxmltree::Document::parse(xml) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Skipping malformed drawing part {}: {}", part_path, e);
            return Vec::new();
        }
    };

    let fragments = match DrawingKind::from_path(part_path) {
        DrawingKind::Modern => parse_anchored_shapes(&doc),
        DrawingKind::Legacy => parse_vml_shapes(&doc),
    };
    dedup_fragments(fragments)
}

/// Drop repeated `(row, col, text)` triples, keeping the first occurrence.
pub fn dedup_fragments(fragments: Vec<PositionedFragment>) -> Vec<PositionedFragment> {
    let mut seen = AHashSet::with_capacity(fragments.len());
    fragments
        .into_iter()
        .filter(|fragment| seen.insert(fragment.clone()))
        .collect()
}

fn parse_anchored_shapes(doc: &roxmltree::Document<'_>) -> Vec<PositionedFragment> {
    let mut fragments = Vec::new();

    for anchor in doc.descendants().filter(|n| is_anchor(n)) {
        let mut texts = Vec::new();
        collect_shape_texts(anchor, &mut texts);
        if texts.is_empty() {
            continue;
        }

        let (row, col) = anchor_position(anchor);
        fragments.extend(texts.into_iter().map(|text| PositionedFragment { row, col, text }));
    }

    fragments
}

fn is_anchor(node: &Node<'_, '_>) -> bool {
    node.has_tag_name((SPREADSHEET_DRAWING_NAMESPACE, "twoCellAnchor"))
        || node.has_tag_name((SPREADSHEET_DRAWING_NAMESPACE, "oneCellAnchor"))
}

/// Walk direct `sp` children and recurse into direct `grpSp` children.
fn collect_shape_texts(node: Node<'_, '_>, texts: &mut Vec<String>) {
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "sp" => {
                let raw: String = child
                    .descendants()
                    .filter(|n| n.has_tag_name((DRAWING_MAIN_NAMESPACE, "t")))
                    .filter_map(|n| n.text())
                    .collect();
                let text = normalize_whitespace(&raw);
                if !text.is_empty() {
                    texts.push(text);
                }
            }
            "grpSp" => collect_shape_texts(child, texts),
            _ => {}
        }
    }
}

/// Grid cell of an anchor.
///
/// A two-cell anchor sits at the floor midpoint of `from` and `to` per axis, falling back to
/// `from` when `to` is missing or unreadable. A one-cell anchor sits at `from`.
fn anchor_position(anchor: Node<'_, '_>) -> (Option<u32>, Option<u32>) {
    let (from_row, from_col) = marker(anchor, "from");
    if !anchor.has_tag_name((SPREADSHEET_DRAWING_NAMESPACE, "twoCellAnchor")) {
        return (from_row, from_col);
    }
    let (to_row, to_col) = marker(anchor, "to");
    (midpoint(from_row, to_row), midpoint(from_col, to_col))
}

fn midpoint(from: Option<u32>, to: Option<u32>) -> Option<u32> {
    match (from, to) {
        (Some(a), Some(b)) => Some(((u64::from(a) + u64::from(b)) / 2) as u32),
        (from, _) => from,
    }
}

fn marker(anchor: Node<'_, '_>, name: &str) -> (Option<u32>, Option<u32>) {
    let Some(marker) = anchor
        .children()
        .find(|n| n.has_tag_name((SPREADSHEET_DRAWING_NAMESPACE, name)))
    else {
        return (None, None);
    };
    let read = |field: &str| {
        marker
            .children()
            .find(|n| n.has_tag_name((SPREADSHEET_DRAWING_NAMESPACE, field)))
            .and_then(|n| n.text())
            .and_then(|t| t.trim().parse::<u32>().ok())
    };
    (read("row"), read("col"))
}

/// Text boxes and text paths; VML carries no dependable grid position.
fn parse_vml_shapes(doc: &roxmltree::Document<'_>) -> Vec<PositionedFragment> {
    doc.descendants()
        .filter_map(|node| {
            if node.has_tag_name((VML_NAMESPACE, "textbox")) {
                let raw: String = node.descendants().filter_map(|n| if n.is_text() { n.text() } else { None }).collect();
                Some(normalize_whitespace(&raw))
            } else if node.has_tag_name((VML_NAMESPACE, "textpath")) {
                node.attribute("string").map(normalize_whitespace)
            } else {
                None
            }
        })
        .filter(|text| !text.is_empty())
        .map(PositionedFragment::unpositioned)
        .collect()
}
