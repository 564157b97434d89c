//! Whole-document extraction through the public API.

mod common;

use common::*;
use pitchtext::{
    DOCX_MIME_TYPE, EXCEL_MIME_TYPE, ExtractionConfig, FormatMetadata, PLAIN_TEXT_MIME_TYPE, POWER_POINT_MIME_TYPE,
    PitchtextError, batch_extract_bytes, extract_bytes, extract_named_bytes,
};

fn problem_solution_workbook() -> Vec<Vec<u8>> {
    let mut parts = workbook_parts(&["Sheet1"]);
    parts.push((
        "xl/worksheets/sheet1.xml",
        worksheet(&[(
            1,
            vec![
                text_cell("A1", "Problem"),
                text_cell("B1", ""),
                text_cell("C1", "Solution"),
            ],
        )]),
    ));
    parts.push((
        "xl/worksheets/_rels/sheet1.xml.rels",
        drawing_relationship("../drawings/drawing1.xml"),
    ));
    parts.push(("xl/drawings/drawing1.xml", drawing(&[((0, 0), (0, 0), "Note")])));
    vec![build_package(&parts)]
}

#[tokio::test]
async fn test_sheet_cells_and_anchored_shape() {
    let bytes = problem_solution_workbook().remove(0);
    let result = extract_bytes(&bytes, EXCEL_MIME_TYPE, &ExtractionConfig::default())
        .await
        .unwrap();

    assert_eq!(
        result.content,
        "【Sheet: Sheet1】\nProblem\tSolution\n\n\n【Shapes in \"Sheet1\"】\nNote"
    );
    match &result.metadata.format {
        Some(FormatMetadata::Excel(meta)) => {
            assert_eq!(meta.sheet_names, vec!["Sheet1"]);
            assert_eq!(meta.shape_count, 1);
        }
        other => panic!("unexpected metadata: {:?}", other),
    }
}

#[tokio::test]
async fn test_unassociated_drawing_is_kept_under_unknown_sheet() {
    let mut parts = workbook_parts(&["Pitch"]);
    parts.push((
        "xl/worksheets/sheet1.xml",
        worksheet(&[(1, vec![text_cell("A1", "Team")])]),
    ));
    parts.push(("xl/drawings/drawing4.xml", drawing(&[((1, 1), (3, 3), "Lost callout")])));
    let bytes = build_package(&parts);

    let result = extract_bytes(&bytes, EXCEL_MIME_TYPE, &ExtractionConfig::default())
        .await
        .unwrap();
    assert!(result.content.starts_with("【Sheet: Pitch】\nTeam\n"));
    assert!(result.content.ends_with("【Shapes in \"Unknown Sheet\"】\nLost callout"));
}

#[tokio::test]
async fn test_unknown_sheet_label_is_configurable() {
    let mut parts = workbook_parts(&["Pitch"]);
    parts.push(("xl/worksheets/sheet1.xml", worksheet(&[])));
    parts.push(("xl/drawings/drawing1.xml", drawing(&[((0, 0), (0, 0), "Floating")])));
    let bytes = build_package(&parts);

    let mut config = ExtractionConfig::default();
    config.labels.unknown_sheet = "Unassigned".to_string();
    config.labels.empty_sheet = "(empty)".to_string();

    let result = extract_bytes(&bytes, EXCEL_MIME_TYPE, &config).await.unwrap();
    assert_eq!(
        result.content,
        "【Sheet: Pitch】\n(empty)\n\n\n【Shapes in \"Unassigned\"】\nFloating"
    );
}

#[tokio::test]
async fn test_batch_with_corrupt_middle_file() {
    let workbook = problem_solution_workbook().remove(0);
    let contents: Vec<(&[u8], &str)> = vec![
        (b"Deck notes".as_slice(), PLAIN_TEXT_MIME_TYPE),
        (b"PK\x03\x04 truncated".as_slice(), EXCEL_MIME_TYPE),
        (workbook.as_slice(), EXCEL_MIME_TYPE),
    ];

    let results = batch_extract_bytes(contents, &ExtractionConfig::default()).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].content, "Deck notes");
    assert!(results[1].is_error());
    assert!(results[1].content.starts_with("Error: "));
    assert_eq!(results[1].metadata.error.as_ref().unwrap().error_type, "CorruptContainer");
    assert!(results[2].content.contains("Problem\tSolution"));
}

#[tokio::test]
async fn test_word_document_outline() {
    let body = format!(
        r#"<w:document xmlns:w="{WORD_NS}"><w:body>
        <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Market</w:t></w:r></w:p>
        <w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Size</w:t></w:r></w:p>
        <w:p><w:r><w:t>Large and growing.</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Plumbers</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr><w:ilvl w:val="1"/><w:numId w:val="1"/></w:numPr></w:pPr><w:r><w:t>Residential</w:t></w:r></w:p>
        <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Year</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Revenue</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
        </w:body></w:document>"#
    );
    let bytes = build_package(&[("word/document.xml", body)]);

    let result = extract_named_bytes(&bytes, "plan.docx", &ExtractionConfig::default())
        .await
        .unwrap();

    assert_eq!(result.mime_type, DOCX_MIME_TYPE);
    assert_eq!(
        result.content,
        "Market\n  Size\nLarge and growing.\n  • Plumbers\n    • Residential\nYear | Revenue"
    );
}

#[tokio::test]
async fn test_presentation_slides_in_numeric_order() {
    let bytes = build_package(&[
        ("ppt/presentation.xml", format!(r#"<p:presentation xmlns:p="{PRESENTATION_NS}"/>"#)),
        ("ppt/slides/slide10.xml", slide(&["Ask"])),
        ("ppt/slides/slide2.xml", slide(&["Problem", "Solution"])),
        ("ppt/slides/slide1.xml", slide(&["Acme"])),
    ]);

    let result = extract_bytes(&bytes, POWER_POINT_MIME_TYPE, &ExtractionConfig::default())
        .await
        .unwrap();

    let first = result.content.find("slide1.xml").unwrap();
    let second = result.content.find("slide2.xml").unwrap();
    let tenth = result.content.find("slide10.xml").unwrap();
    assert!(first < second && second < tenth);
    assert!(result.content.contains("【Slide: ppt/slides/slide2.xml】\nProblem\nSolution\n"));
}

#[tokio::test]
async fn test_unsupported_name_is_rejected_before_parsing() {
    let result = extract_named_bytes(b"PK\x03\x04", "deck.key", &ExtractionConfig::default()).await;
    assert!(matches!(result, Err(PitchtextError::UnsupportedFormat(_))));
}
