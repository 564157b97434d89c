//! Relationship graph resolution for OOXML packages.
//!
//! A workbook names its sheets in `xl/workbook.xml` and points at their parts through
//! `xl/_rels/workbook.xml.rels`; each sheet in turn points at its drawings through its own
//! `_rels/<sheet>.xml.rels`. This module joins those descriptors into [`SheetDescriptor`]s
//! and a drawing-to-sheet [`DrawingAssociation`].

use crate::error::{PitchtextError, Result};
use crate::extraction::container::PartSource;
use indexmap::IndexMap;
use indexmap::map::Entry;

pub const PACKAGE_RELS_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// One `<Relationship>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEntry {
    pub id: String,
    pub target: String,
    pub rel_type: String,
    pub external: bool,
}

impl RelationshipEntry {
    /// Whether the relationship type URI ends in `/{kind}`, e.g. `drawing` or `vmlDrawing`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type
            .strip_suffix(kind)
            .is_some_and(|prefix| prefix.ends_with('/'))
    }
}

/// Relationship id to entry, in declaration order.
pub type RelationshipMap = IndexMap<String, RelationshipEntry>;

/// Resolve `target` against `base_dir` into a canonical in-package path.
///
/// Backslashes become forward slashes, leading and trailing slashes are dropped, `.` and
/// empty segments are skipped and `..` pops one segment. Popping past the package root is
/// a no-op.
pub fn resolve_path(base_dir: &str, target: &str) -> String {
    let base = base_dir.replace('\\', "/");
    let target = target.replace('\\', "/");

    let mut segments: Vec<&str> = base
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    for segment in target.trim_matches('/').split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Resolve a relationship target, treating a leading `/` as package-root-relative.
pub fn resolve_target(base_dir: &str, target: &str) -> String {
    if target.starts_with('/') || target.starts_with('\\') {
        resolve_path("", target)
    } else {
        resolve_path(base_dir, target)
    }
}

/// Directory part of a package path (`xl/worksheets/sheet1.xml` gives `xl/worksheets`).
pub fn parent_dir(part_path: &str) -> &str {
    part_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Conventional relationship part for a package part: `{dir}/_rels/{file}.rels`.
pub fn rels_path_for(part_path: &str) -> String {
    match part_path.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_path),
    }
}

/// Parse a `.rels` part into an id-keyed map.
///
/// A duplicated id keeps its first position but takes the last entry's value.
pub fn build_relationship_map(rels_xml: &str) -> Result<RelationshipMap> {
    let doc = roxmltree::Document::parse(rels_xml)
        .map_err(|e| PitchtextError::parsing_with_source("Failed to parse relationships", e))?;

    let mut map = RelationshipMap::new();
    for node in doc.descendants().filter(|n| n.has_tag_name("Relationship")) {
        let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) else {
            continue;
        };
        let entry = RelationshipEntry {
            id: id.to_string(),
            target: target.to_string(),
            rel_type: node.attribute("Type").unwrap_or_default().to_string(),
            external: node.attribute("TargetMode") == Some("External"),
        };
        map.insert(entry.id.clone(), entry);
    }
    Ok(map)
}

/// One sheet (or slide) as declared by its owning document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub index: usize,
    pub name: Option<String>,
    pub relationship_id: Option<String>,
}

/// Read declared sheets (`<sheet>`) or slides (`<sldId>`) in document order.
///
/// The index is the enumeration position; `sheetId` attributes are ignored.
pub fn build_sheet_index(document_xml: &str) -> Result<Vec<SheetEntry>> {
    let doc = roxmltree::Document::parse(document_xml)
        .map_err(|e| PitchtextError::parsing_with_source("Failed to parse sheet declarations", e))?;

    let entries = doc
        .descendants()
        .filter(|n| n.is_element() && matches!(n.tag_name().name(), "sheet" | "sldId"))
        .enumerate()
        .map(|(index, node)| SheetEntry {
            index,
            name: node.attribute("name").map(str::to_string),
            relationship_id: relationship_id_attribute(node),
        })
        .collect();
    Ok(entries)
}

/// `r:id` in either the transitional or the strict relationships namespace.
fn relationship_id_attribute(node: roxmltree::Node<'_, '_>) -> Option<String> {
    node.attributes()
        .find(|attr| attr.name() == "id" && attr.namespace().is_some_and(|ns| ns.ends_with("/relationships")))
        .map(|attr| attr.value().to_string())
}

/// A declared sheet joined with the part that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDescriptor {
    pub index: usize,
    pub name: String,
    pub relationship_id: Option<String>,
    pub file_path: Option<String>,
}

/// Join sheet declarations with the owning part's relationships.
///
/// Sheets without a name get a positional label (`Sheet1`, `Sheet2`, ...). Only
/// relationships whose type ends in `/{kind}` are considered.
pub fn describe_sheets(
    entries: &[SheetEntry],
    relationships: &RelationshipMap,
    base_dir: &str,
    kind: &str,
) -> Vec<SheetDescriptor> {
    entries
        .iter()
        .map(|entry| {
            let file_path = entry
                .relationship_id
                .as_deref()
                .and_then(|id| relationships.get(id))
                .filter(|rel| rel.is_kind(kind) && !rel.external)
                .map(|rel| resolve_target(base_dir, &rel.target));
            SheetDescriptor {
                index: entry.index,
                name: entry
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Sheet{}", entry.index + 1)),
                relationship_id: entry.relationship_id.clone(),
                file_path,
            }
        })
        .collect()
}

/// Read the workbook's sheet list and resolve each sheet's part.
///
/// Missing or malformed workbook parts degrade to whatever could be read.
pub fn load_workbook_sheets(source: &mut impl PartSource) -> Vec<SheetDescriptor> {
    let entries = match source.read_text("xl/workbook.xml") {
        Some(xml) => build_sheet_index(&xml).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable xl/workbook.xml: {}", e);
            Vec::new()
        }),
        None => {
            tracing::debug!("Package has no xl/workbook.xml");
            Vec::new()
        }
    };

    let relationships = source
        .read_text("xl/_rels/workbook.xml.rels")
        .and_then(|xml| {
            build_relationship_map(&xml)
                .map_err(|e| tracing::warn!("Ignoring unreadable workbook relationships: {}", e))
                .ok()
        })
        .unwrap_or_default();

    describe_sheets(&entries, &relationships, "xl", "worksheet")
}

/// Where a drawing part's content is filed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociatedSheet {
    pub sheet: String,
    pub legacy: bool,
}

/// Drawing part path to owning sheet name, in association order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawingAssociation {
    entries: IndexMap<String, AssociatedSheet>,
}

impl DrawingAssociation {
    /// Record an association.
    ///
    /// The first modern drawing for a path wins. A legacy (VML) drawing only fills a path
    /// nothing is mapped to yet, and a later modern drawing replaces a legacy one.
    pub fn record(&mut self, drawing_path: String, sheet: &str, legacy: bool) {
        match self.entries.entry(drawing_path) {
            Entry::Vacant(slot) => {
                slot.insert(AssociatedSheet {
                    sheet: sheet.to_string(),
                    legacy,
                });
            }
            Entry::Occupied(mut slot) => {
                if slot.get().legacy && !legacy {
                    slot.insert(AssociatedSheet {
                        sheet: sheet.to_string(),
                        legacy,
                    });
                }
            }
        }
    }

    pub fn sheet_for(&self, drawing_path: &str) -> Option<&str> {
        self.entries.get(drawing_path).map(|a| a.sheet.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssociatedSheet)> {
        self.entries.iter().map(|(path, assoc)| (path.as_str(), assoc))
    }

    pub fn contains(&self, drawing_path: &str) -> bool {
        self.entries.contains_key(drawing_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Map every drawing referenced from a sheet's relationship part to that sheet.
///
/// Sheets are visited in declaration order and their relationships in `.rels` order. A
/// sheet with no relationship part, or one that fails to parse, contributes nothing.
pub fn associate_drawings(sheets: &[SheetDescriptor], source: &mut impl PartSource) -> DrawingAssociation {
    let mut association = DrawingAssociation::default();

    for sheet in sheets {
        let Some(sheet_path) = sheet.file_path.as_deref() else {
            continue;
        };
        let rels_path = rels_path_for(sheet_path);
        let Some(rels_xml) = source.read_text(&rels_path) else {
            continue;
        };
        let relationships = match build_relationship_map(&rels_xml) {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!("Skipping drawings of sheet '{}': {}", sheet.name, e);
                continue;
            }
        };

        let sheet_dir = parent_dir(sheet_path);
        for rel in relationships.values() {
            if rel.external {
                continue;
            }
            let legacy = rel.is_kind("vmlDrawing");
            if !legacy && !rel.is_kind("drawing") {
                continue;
            }
            let drawing_path = resolve_target(sheet_dir, &rel.target);
            if drawing_path.is_empty() {
                tracing::debug!("Empty drawing target '{}' in {}", rel.target, rels_path);
                continue;
            }
            association.record(drawing_path, &sheet.name, legacy);
        }
    }

    association
}

/// Relationships of a part that point at comment parts, resolved to package paths.
pub fn comment_parts_for(sheet_path: &str, source: &mut impl PartSource) -> Vec<String> {
    let Some(rels_xml) = source.read_text(&rels_path_for(sheet_path)) else {
        return Vec::new();
    };
    let Ok(relationships) = build_relationship_map(&rels_xml) else {
        return Vec::new();
    };
    let sheet_dir = parent_dir(sheet_path);
    relationships
        .values()
        .filter(|rel| rel.is_kind("comments") && !rel.external)
        .map(|rel| resolve_target(sheet_dir, &rel.target))
        .collect()
}
