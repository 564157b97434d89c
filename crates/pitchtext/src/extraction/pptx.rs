//! Presentation extraction: slide text, speaker notes and drawing shapes.

use crate::error::{PitchtextError, Result};
use crate::extraction::container::{Container, PartSource};
use crate::extraction::grid::compose;
use crate::extraction::properties::CoreProperties;
use crate::extraction::shapes::{DRAWING_MAIN_NAMESPACE, dedup_fragments, parse_shapes};
use once_cell::sync::Lazy;
use regex::Regex;

static SLIDE_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ppt/slides/slide(\d+)\.xml$").expect("Slide part pattern is valid and should compile")
});

static NOTES_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ppt/notesSlides/notesSlide(\d+)\.xml$").expect("Notes part pattern is valid and should compile")
});

static PRESENTATION_DRAWING_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^ppt/drawings/(drawing\d+\.xml|vmlDrawing\d+\.vml)$")
        .expect("Presentation drawing pattern is valid and should compile")
});

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PresentationContent {
    pub content: String,
    /// Slides that produced text
    pub slide_count: usize,
    /// Notes pages that produced text
    pub notes_count: usize,
    pub shape_count: usize,
    pub properties: CoreProperties,
}

/// Extract a `.pptx` package.
///
/// # Errors
///
/// `CorruptContainer` for bytes that are not a ZIP package, `Parsing` when there is no
/// `ppt/presentation.xml`. Individual slides that fail to parse are skipped.
pub fn extract_pptx(bytes: &[u8], include_notes: bool) -> Result<PresentationContent> {
    let mut container = Container::open(bytes)?;
    if !container.has_part("ppt/presentation.xml") {
        return Err(PitchtextError::parsing("Package has no ppt/presentation.xml"));
    }
    let properties = CoreProperties::load(&mut container);
    let names = container.part_names();

    let mut content = String::new();
    let slide_count = append_text_parts(&mut container, &numbered_parts(&names, &SLIDE_PART), "Slide", &mut content);
    let notes_count = if include_notes {
        append_text_parts(&mut container, &numbered_parts(&names, &NOTES_PART), "Notes", &mut content)
    } else {
        0
    };

    let mut fragments = Vec::new();
    for name in names.iter().filter(|n| PRESENTATION_DRAWING_PART.is_match(n)) {
        if let Some(xml) = container.read_text(name) {
            fragments.extend(parse_shapes(&xml, name));
        }
    }
    let fragments = dedup_fragments(fragments);
    let shape_text = compose(&fragments).pooled_text();
    if !shape_text.is_empty() {
        content.push_str(&format!("\n【Shapes in PowerPoint】\n{}\n", shape_text));
    }

    Ok(PresentationContent {
        content,
        slide_count,
        notes_count,
        shape_count: fragments.len(),
        properties,
    })
}

/// Part names matching `pattern`, ordered by the number embedded in the name.
pub fn numbered_parts(names: &[String], pattern: &Regex) -> Vec<String> {
    let mut numbered: Vec<(u64, &String)> = names
        .iter()
        .filter_map(|name| {
            let number = pattern.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((number, name))
        })
        .collect();
    numbered.sort_by_key(|(number, _)| *number);
    numbered.into_iter().map(|(_, name)| name.clone()).collect()
}

fn append_text_parts(source: &mut impl PartSource, parts: &[String], label: &str, content: &mut String) -> usize {
    let mut written = 0;
    for part in parts {
        let Some(xml) = source.read_text(part) else {
            continue;
        };
        let Some(runs) = text_runs(&xml) else {
            tracing::warn!("Skipping unreadable part {}", part);
            continue;
        };
        if runs.is_empty() {
            continue;
        }
        content.push_str(&format!("【{}: {}】\n", label, part));
        for run in runs {
            content.push_str(&run);
            content.push('\n');
        }
        content.push('\n');
        written += 1;
    }
    written
}

/// Non-blank `a:t` texts in document order, spacing kept; `None` for malformed XML.
pub fn text_runs(xml: &str) -> Option<Vec<String>> {
    let doc = roxmltree::Document::parse(xml).ok()?;
    Some(
        doc.descendants()
            .filter(|n| n.has_tag_name((DRAWING_MAIN_NAMESPACE, "t")))
            .filter_map(|n| n.text())
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::container::test_support::build_package;

    fn slide(texts: &[&str]) -> String {
        let paragraphs: String = texts.iter().map(|t| format!("<a:p><a:r><a:t>{t}</a:t></a:r></a:p>")).collect();
        format!(
            r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="{DRAWING_MAIN_NAMESPACE}"><p:cSld><p:spTree><p:sp><p:txBody>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#
        )
    }

    #[test]
    fn test_slides_are_ordered_numerically() {
        let names: Vec<String> = ["ppt/slides/slide10.xml", "ppt/slides/slide2.xml", "ppt/slides/slide1.xml", "ppt/slides/_rels/slide1.xml.rels"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            numbered_parts(&names, &SLIDE_PART),
            vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml", "ppt/slides/slide10.xml"]
        );
    }

    #[test]
    fn test_extract_slides_and_notes() {
        let bytes = build_package(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/slides/slide2.xml", &slide(&["Traction", "  "])),
            ("ppt/slides/slide1.xml", &slide(&[" Acme ", "Payments for plumbers"])),
            ("ppt/slides/slide3.xml", &slide(&[])),
            ("ppt/notesSlides/notesSlide1.xml", &slide(&["Open with the story"])),
        ]);

        let presentation = extract_pptx(&bytes, true).unwrap();
        assert_eq!(
            presentation.content,
            "【Slide: ppt/slides/slide1.xml】\n Acme \nPayments for plumbers\n\n\
             【Slide: ppt/slides/slide2.xml】\nTraction\n\n\
             【Notes: ppt/notesSlides/notesSlide1.xml】\nOpen with the story\n\n"
        );
        assert_eq!(presentation.slide_count, 2);
        assert_eq!(presentation.notes_count, 1);

        let without_notes = extract_pptx(&bytes, false).unwrap();
        assert!(!without_notes.content.contains("【Notes"));
    }

    #[test]
    fn test_presentation_drawings_are_pooled() {
        let drawing = format!(
            r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="{DRAWING_MAIN_NAMESPACE}"><xdr:oneCellAnchor><xdr:from><xdr:col>0</xdr:col><xdr:row>0</xdr:row></xdr:from><xdr:sp><xdr:txBody><a:p><a:r><a:t>Roadmap</a:t></a:r></a:p></xdr:txBody></xdr:sp></xdr:oneCellAnchor></xdr:wsDr>"#
        );
        let bytes = build_package(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/drawings/drawing1.xml", &drawing),
        ]);
        let presentation = extract_pptx(&bytes, true).unwrap();
        assert_eq!(presentation.content, "\n【Shapes in PowerPoint】\nRoadmap\n");
        assert_eq!(presentation.shape_count, 1);
    }

    #[test]
    fn test_malformed_slide_is_skipped() {
        let bytes = build_package(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/slides/slide1.xml", "<p:sld><broken"),
            ("ppt/slides/slide2.xml", &slide(&["Still here"])),
        ]);
        let presentation = extract_pptx(&bytes, true).unwrap();
        assert_eq!(presentation.content, "【Slide: ppt/slides/slide2.xml】\nStill here\n\n");
    }

    #[test]
    fn test_missing_presentation_part_is_parsing_error() {
        let bytes = build_package(&[("ppt/slides/slide1.xml", &slide(&["Orphan"]))]);
        assert!(matches!(extract_pptx(&bytes, true), Err(PitchtextError::Parsing { .. })));
    }
}
